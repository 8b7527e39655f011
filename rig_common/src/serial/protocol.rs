//! Line protocol shared with the microcontrollers.
//!
//! | Direction         | Payload                   | Example |
//! |-------------------|---------------------------|---------|
//! | host → servo MCU  | angle in degrees, 0..=180 | `90\n`  |
//! | sensor MCU → host | raw distance, integer     | `120\r\n` |

use super::link::LinkError;

/// Encode a servo angle command (without terminator).
pub fn format_angle_line(angle: u8) -> String {
    angle.to_string()
}

/// Decode one distance reading.
///
/// Surrounding whitespace is tolerated; anything else that is not a base-10
/// `i32` is a [`LinkError::Parse`].
pub fn parse_reading(line: &str) -> Result<i32, LinkError> {
    line.trim().parse::<i32>().map_err(|e| LinkError::Parse {
        line: line.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_lines_are_plain_integers() {
        assert_eq!(format_angle_line(90), "90");
        assert_eq!(format_angle_line(0), "0");
        assert_eq!(format_angle_line(180), "180");
    }

    #[test]
    fn readings_tolerate_whitespace() {
        assert_eq!(parse_reading("120").unwrap(), 120);
        assert_eq!(parse_reading(" 42 \r").unwrap(), 42);
        assert_eq!(parse_reading("-3").unwrap(), -3);
    }

    #[test]
    fn malformed_readings_are_parse_errors() {
        for line in ["", "abc", "12.5", "1 2", "99999999999"] {
            let err = parse_reading(line).unwrap_err();
            assert!(matches!(err, LinkError::Parse { .. }), "{line:?}");
            assert!(!err.is_fatal());
        }
    }
}
