use crate::annotation::Label;
use std::fmt;

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Color {
    Green,
    Purple,
    Red,
    Blue,
    Black,
    Gray,
    LightGray,
    Orange,
}

impl fmt::Display for Color {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Color::Green => write!(formatter, "#009D4E"),
            Color::Purple => write!(formatter, "#814ED1"),
            Color::Red => write!(formatter, "#E3371E"),
            Color::Blue => write!(formatter, "#1383C6"),
            Color::Black => write!(formatter, "#000000"),
            Color::Gray => write!(formatter, "#8C8C8C"),
            Color::LightGray => write!(formatter, "#D1D1D1"),
            Color::Orange => write!(formatter, "#E16A2C"),
        }
    }
}

pub fn label_color(label: Label) -> Color {
    match label {
        Label::Normal => Color::Green,
        Label::Noise => Color::Blue,
        Label::AF => Color::Red,
        Label::Other => Color::Purple,
        Label::NoSignal => Color::Black,
        Label::NotAF => Color::Gray,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_have_distinct_colors() {
        let colors: Vec<Color> = Label::ALL.into_iter().map(label_color).collect();
        for (i, a) in colors.iter().enumerate() {
            assert!(colors[i + 1..].iter().all(|b| a != b));
            assert_ne!(*a, Color::LightGray);
        }
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(label_color(Label::AF).to_string(), "#E3371E");
        assert_eq!(label_color(Label::Noise).to_string(), "#1383C6");
        assert_eq!(label_color(Label::Other).to_string(), "#814ED1");
        assert_eq!(Color::Black.to_string(), "#000000");
    }
}
