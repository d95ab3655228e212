/*!

  Utils for circuit development.

*/

/// Compare rendered truth tables (or anything with `lines()`) as strings, ignoring surrounding whitespace on each line.
#[macro_export]
macro_rules! assert_table_eq {
    ($left:expr, $right:expr $(,)?) => {
        match (&$left, &$right) {
            (left_val, right_val) => {
                let left_lines: Vec<&str> = left_val.lines().map(|l| l.trim()).filter(|l| !l.is_empty()).collect();
                let right_lines: Vec<&str> = right_val.lines().map(|l| l.trim()).filter(|l| !l.is_empty()).collect();
                assert_eq!(left_lines.len(), right_lines.len(), "Tables differ in row count");
                for (left_line, right_line) in left_lines.iter().zip(right_lines.iter()) {
                    assert_eq!(left_line, right_line);
                }
            }
        }
    };
    ($left:expr, $right:expr, $($arg:tt)+) => {
        match (&$left, &$right) {
            (left_val, right_val) => {
                let left_lines: Vec<&str> = left_val.lines().map(|l| l.trim()).filter(|l| !l.is_empty()).collect();
                let right_lines: Vec<&str> = right_val.lines().map(|l| l.trim()).filter(|l| !l.is_empty()).collect();
                assert_eq!(left_lines.len(), right_lines.len(), std::format_args!($($arg)+));
                for (left_line, right_line) in left_lines.iter().zip(right_lines.iter()) {
                    assert_eq!(
                        left_line,
                        right_line,
                        std::format_args!($($arg)+)
                    );
                }
            }
        }
    };
}
