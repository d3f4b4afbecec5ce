
use chrono::NaiveDate;
use std::fmt::Display;
use std::str::FromStr;

/// Number of leading characters in a run folder that encode the run date
pub const DATE_PREFIX_LEN: usize = 6;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RunIdError {
    #[error("run identifier {name:?} is too short to carry a YYMMDD date prefix")]
    TooShort { name: String },
    #[error("run identifier {name:?} does not start with a YYMMDD date")]
    InvalidDate { name: String },
}

/// A sequencing run identifier, parsed from the run folder name.
/// Folder names follow `YYMMDD_<instrument>_<counter>_<flowcell token>`, where the flowcell token
/// carries a one character prefix (the flowcell position) ahead of the actual flowcell ID.
#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct RunIdentifier {
    /// The literal folder name
    name: String,
    /// Run date from the first six characters
    date: NaiveDate,
    /// Second `_` field, empty if absent
    instrument_id: String,
    /// Fourth `_` field with the position character removed
    flowcell_id: Option<String>
}

impl RunIdentifier {
    /// Parses a run folder name.
    /// # Errors
    /// * if the name is too short to carry a date
    /// * if the first six characters are not a valid `%y%m%d` date
    pub fn parse(name: &str) -> Result<Self, RunIdError> {
        let date_prefix = name.get(..DATE_PREFIX_LEN)
            .ok_or_else(|| RunIdError::TooShort { name: name.to_string() })?;
        if !date_prefix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RunIdError::InvalidDate { name: name.to_string() });
        }
        let date = NaiveDate::parse_from_str(date_prefix, "%y%m%d")
            .map_err(|_e| RunIdError::InvalidDate { name: name.to_string() })?;

        let fields: Vec<&str> = name.split('_').collect();
        let instrument_id = fields.get(1).copied().unwrap_or_default().to_string();
        let flowcell_id = fields.get(3)
            .and_then(|token| {
                let mut chars = token.chars();
                chars.next()?;
                let stripped = chars.as_str();
                if stripped.is_empty() {
                    None
                } else {
                    Some(stripped.to_string())
                }
            });

        Ok(Self {
            name: name.to_string(),
            date,
            instrument_id,
            flowcell_id
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The raw `YYMMDD` prefix, used to match the "Run name" inside reports
    pub fn date_prefix(&self) -> &str {
        &self.name[..DATE_PREFIX_LEN]
    }

    pub fn instrument_id(&self) -> &str {
        &self.instrument_id
    }

    pub fn flowcell_id(&self) -> Option<&str> {
        self.flowcell_id.as_deref()
    }
}

impl FromStr for RunIdentifier {
    type Err = RunIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for RunIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
