
use std::fmt::Display;

/// A single normalized spreadsheet cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    /// Free text, never empty after normalization
    Text(String),
    /// Any numeric cell
    Number(f64),
    /// Blank cell
    #[default]
    Empty
}

impl CellValue {
    /// Normalizes raw exported text into a cell.
    /// Blank text becomes `Empty`, finite numeric text becomes `Number`, everything else stays `Text`.
    pub fn from_raw_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => CellValue::Number(value),
            _ => CellValue::Text(raw.to_string())
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            CellValue::Number(_) |
            CellValue::Empty => None
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Numeric view of the cell; text is parsed leniently (decimal commas, `%`, spaces).
    pub fn to_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) => Some(*value),
            CellValue::Text(text) => {
                let cleaned: String = text.chars()
                    .filter(|c| !c.is_whitespace() && *c != '%')
                    .map(|c| if c == ',' { '.' } else { c })
                    .collect();
                cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
            },
            CellValue::Empty => None
        }
    }

    /// Owned display string, or None for blank cells
    pub fn to_display_string(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Text(text) => write!(f, "{text}"),
            // integral numbers print without the trailing ".0", e.g. cycle counts
            CellValue::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => write!(f, "{}", *value as i64),
            CellValue::Number(value) => write!(f, "{value}"),
            CellValue::Empty => Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_text() {
        assert_eq!(CellValue::from_raw_text(""), CellValue::Empty);
        assert_eq!(CellValue::from_raw_text("   "), CellValue::Empty);
        assert_eq!(CellValue::from_raw_text("151"), CellValue::Number(151.0));
        assert_eq!(CellValue::from_raw_text(" 2.5 "), CellValue::Number(2.5));
        assert_eq!(CellValue::from_raw_text("Run name"), CellValue::Text("Run name".to_string()));
        assert_eq!(CellValue::from_raw_text("inf"), CellValue::Text("inf".to_string()));
    }

    #[test]
    fn test_to_number() {
        assert_eq!(CellValue::Number(1.5).to_number(), Some(1.5));
        assert_eq!(CellValue::Text("1,5 %".to_string()).to_number(), Some(1.5));
        assert_eq!(CellValue::Text("n/a".to_string()).to_number(), None);
        assert_eq!(CellValue::Empty.to_number(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(CellValue::Number(151.0).to_string(), "151");
        assert_eq!(CellValue::Number(92.35).to_string(), "92.35");
        assert_eq!(CellValue::Text("HGTJ5BGXY".to_string()).to_string(), "HGTJ5BGXY");
        assert_eq!(CellValue::Empty.to_display_string(), None);
    }
}
