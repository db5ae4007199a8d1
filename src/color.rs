use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
  pub r: u8,
  pub g: u8,
  pub b: u8,
}

impl Color {
  pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
    Color { r, g, b }
  }
}

impl fmt::Display for Color {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
  }
}

impl Serialize for Color {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

pub const RED: Color = Color::rgb(0xff, 0x00, 0x00);
pub const GREEN: Color = Color::rgb(0x00, 0xff, 0x00);
pub const BLUE: Color = Color::rgb(0x00, 0x00, 0xff);
pub const YELLOW: Color = Color::rgb(0xff, 0xff, 0x00);
pub const ORANGE: Color = Color::rgb(0xff, 0x80, 0x00);
pub const PURPLE: Color = Color::rgb(0x80, 0x00, 0xff);
pub const CYAN: Color = Color::rgb(0x00, 0xff, 0xff);
pub const PINK: Color = Color::rgb(0xff, 0x00, 0x80);
pub const FALLBACK: Color = Color::rgb(0x80, 0x80, 0x80);

/// Palette indexed by the position-within-quadrant digit, 1 through 8.
const PALETTE: [Color; 8] = [RED, GREEN, BLUE, YELLOW, ORANGE, PURPLE, CYAN, PINK];

/// Color for a tooth in FDI notation.
///
/// Keyed on the last digit, so the same tooth type shares a color across
/// all four quadrants (11, 21, 31 and 41 are all red).
pub fn color_for_notation(notation: i32) -> Color {
  match notation.unsigned_abs() % 10 {
    digit @ 1..=8 => PALETTE[digit as usize - 1],
    _ => FALLBACK,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_same_last_digit_same_color() {
    assert_eq!(color_for_notation(21), color_for_notation(11));
    assert_eq!(color_for_notation(47), color_for_notation(17));
    assert_eq!(color_for_notation(-3), color_for_notation(33));
  }

  #[test]
  fn test_palette_order() {
    assert_eq!(color_for_notation(11), RED);
    assert_eq!(color_for_notation(22), GREEN);
    assert_eq!(color_for_notation(33), BLUE);
    assert_eq!(color_for_notation(44), YELLOW);
    assert_eq!(color_for_notation(15), ORANGE);
    assert_eq!(color_for_notation(26), PURPLE);
    assert_eq!(color_for_notation(37), CYAN);
    assert_eq!(color_for_notation(28), PINK);
  }

  #[test]
  fn test_fallback_digits() {
    assert_eq!(color_for_notation(0), FALLBACK);
    assert_eq!(color_for_notation(10), FALLBACK);
    assert_eq!(color_for_notation(9), FALLBACK);
    assert_eq!(color_for_notation(29), FALLBACK);
  }

  #[test]
  fn test_extremes_are_total() {
    // |i32::MIN| = 2147483648, last digit 8
    assert_eq!(color_for_notation(i32::MIN), PINK);
    // i32::MAX = 2147483647, last digit 7
    assert_eq!(color_for_notation(i32::MAX), CYAN);
  }

  #[test]
  fn test_hex_format() {
    assert_eq!(ORANGE.to_string(), "#ff8000");
    assert_eq!(serde_json::to_string(&PINK).unwrap(), "\"#ff0080\"");
  }
}
