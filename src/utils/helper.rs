use num_traits::Float;
use ordered_float::{OrderedFloat, PrimitiveFloat};

/// Returns an ascending copy of the values
///
/// Sorting goes through `OrderedFloat`, so a `NaN` sorts above every finite
/// value instead of poisoning the comparison.
///
/// # Arguments
///
/// * `values` - The values to sort
///
/// # Returns
///
/// * `Vec<T>` - The sorted copy
pub fn sorted_copy<T: Float + PrimitiveFloat>(values: &[T]) -> Vec<T> {
    let mut sorted = values.to_vec();
    sorted.sort_by_key(|v| OrderedFloat(*v));
    sorted
}

/// Returns the median from a sorted slice
///
/// The middle value for an odd length, the mean of the two middle values for
/// an even length.
///
/// # Arguments
///
/// * `ss` - The sorted slice
///
/// # Returns
///
/// * `Option<T>` - The median, or `None` if the slice is empty
#[inline]
pub fn median_from_sorted_slice<T: Float>(ss: &[T]) -> Option<T> {
    let len = ss.len();
    if len == 0 {
        return None;
    }
    let mid = len / 2;
    let _2 = T::one() + T::one();
    if len % 2 == 0 {
        Some((ss[mid - 1] + ss[mid]) / _2)
    } else {
        Some(ss[mid])
    }
}

/// Returns the quantile from a sorted slice
///
/// Linear interpolation between the two order statistics around position
/// `q * (len - 1)`.
///
/// # Arguments
///
/// * `ss` - The sorted slice
/// * `q` - The quantile to calculate, in `[0, 1]`
///
/// # Returns
///
/// * `Option<T>` - The quantile, or `None` if the slice is empty or `q` lies
///   outside `[0, 1]`
#[inline]
pub fn quantile_from_sorted_slice<T: Float>(ss: &[T], q: f64) -> Option<T> {
    if ss.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let pos = q * (ss.len() - 1) as f64;
    let lower_index = pos.floor() as usize;
    let upper_index = pos.ceil() as usize;

    let lower_value = *ss.get(lower_index)?;
    if lower_index == upper_index {
        return Some(lower_value);
    }
    let upper_value = *ss.get(upper_index)?;
    let weight = T::from(pos - lower_index as f64)?;
    Some(lower_value + weight * (upper_value - lower_value))
}

/// Returns Tukey's five-number summary from a sorted slice
///
/// The summary is `[min, lower hinge, median, upper hinge, max]`. Hinges are
/// the medians of the lower and upper halves, each half including the overall
/// median when the length is odd. This is the convention box plots draw, and
/// its middle element always equals [`median_from_sorted_slice`].
///
/// # Arguments
///
/// * `ss` - The sorted slice
///
/// # Returns
///
/// * `Option<[T; 5]>` - The summary, or `None` if the slice is empty
pub fn five_number_summary<T: Float>(ss: &[T]) -> Option<[T; 5]> {
    let min = *ss.first()?;
    let max = *ss.last()?;
    let median = median_from_sorted_slice(ss)?;
    let last = ss.len() - 1;
    if last == 0 {
        return Some([min; 5]);
    }

    // hinge depth, counted from either end, is a whole or half position
    let depth = ((ss.len() + 3) / 2) as f64 / 2.0 - 1.0;
    let lower_hinge = quantile_from_sorted_slice(ss, depth / last as f64)?;
    let upper_hinge = quantile_from_sorted_slice(ss, (last as f64 - depth) / last as f64)?;
    Some([min, lower_hinge, median, upper_hinge, max])
}
