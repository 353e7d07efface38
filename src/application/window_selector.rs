// Window selection - grow to the window size, then slide
use crate::domain::window::Window;

/// Maps frame `index` to the record range shown in that frame.
///
/// Frames `0..window_size` grow the window from one record up to
/// `window_size`; later frames slide it forward one record at a time.
/// Panics if `window_size` is zero or `index` is outside `0..len`.
pub fn select_window(index: usize, window_size: usize, len: usize) -> Window {
    assert!(window_size >= 1, "window size must be at least 1");
    assert!(index < len, "frame {} out of range for {} records", index, len);

    let start = if index < window_size {
        0
    } else {
        index - window_size + 1
    };
    Window::new(start, index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_and_length_hold_for_all_frames() {
        for len in 1..30 {
            for window_size in 1..15 {
                for index in 0..len {
                    let window = select_window(index, window_size, len);
                    assert!(window.start < window.end);
                    assert!(window.end <= len);
                    assert_eq!(window.len(), (index + 1).min(window_size));
                    if index >= window_size {
                        assert_eq!(window.len(), window_size);
                    }
                }
            }
        }
    }

    #[test]
    fn test_first_frame_is_single_record() {
        assert_eq!(select_window(0, 10, 3), Window::new(0, 1));
    }

    #[test]
    fn test_growth_phase() {
        assert_eq!(select_window(2, 10, 3), Window::new(0, 3));
        assert_eq!(select_window(9, 10, 20), Window::new(0, 10));
    }

    #[test]
    fn test_slide_phase() {
        assert_eq!(select_window(3, 2, 5), Window::new(2, 4));
        assert_eq!(select_window(4, 2, 5), Window::new(3, 5));
        assert_eq!(select_window(10, 10, 20), Window::new(1, 11));
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_frame_panics() {
        select_window(5, 2, 5);
    }
}
