/* PORTED NUMPY FUNCTIONS */

use ndarray::ArrayView2;

/// Returns the location of the maximum element in the array. Ties resolve to
/// the first occurrence, as `numpy.argmax` does.
///
/// # Arguments
///
/// * `arr` - Input array.
///
/// # Returns
///
/// * The location of the maximum element in the array, or `None` if the array is empty.
pub fn arg_max(arr: &[f32]) -> Option<usize> {
    arr.iter()
        .enumerate()
        .reduce(|(max_index, max_value), (current_index, current_value)| {
            if current_value > max_value {
                (current_index, current_value)
            } else {
                (max_index, max_value)
            }
        })
        .map(|(index, _)| index)
}

/// Location and value of the maximum element of a 2D array, scanning
/// column by column. Ties resolve to the lowest column, then the lowest row.
pub fn arg_max_2d(array: ArrayView2<'_, f32>) -> Option<((usize, usize), f32)> {
    array
        .reversed_axes()
        .indexed_iter()
        .fold(None, |best, ((col, row), &value)| match best {
            Some((_, best_value)) if value <= best_value => best,
            _ => Some(((row, col), value)),
        })
}

/// Calculate the global max value in a 2D array, floored at zero. Activations
/// are non-negative, so this is equivalent to numpy.max for them.
pub fn global_max(array: ArrayView2<'_, f32>) -> f32 {
    array.iter().fold(0.0, |prev, &value| prev.max(value))
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn test_arg_max_first_occurrence() {
        assert_eq!(arg_max(&[0.1, 0.7, 0.3, 0.7]), Some(1));
        assert_eq!(arg_max(&[]), None);
    }

    #[test]
    fn test_arg_max_2d_ties_go_to_lowest_column() {
        let a = array![[0.0, 0.2, 0.9], [0.9, 0.1, 0.0]];
        assert_eq!(arg_max_2d(a.view()), Some(((1, 0), 0.9)));

        let b = array![[0.0, 0.5], [0.5, 0.5]];
        assert_eq!(arg_max_2d(b.view()), Some(((1, 0), 0.5)));
    }

    #[test]
    fn test_global_max() {
        let a = array![[0.0, 0.4], [0.25, 0.1]];
        assert_eq!(global_max(a.view()), 0.4);
    }
}
