use std::{fmt, str::FromStr};

/// Call for one catalog edit in one sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditStatus {
    #[default]
    Uncallable,
    NoIndel,
    HasIndel,
    NoPrimeEdit,
    HasPrimeEdit,
}

/// What one final sequence says about an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evidence {
    Indel,
    NoIndel,
    PrimeEdit,
    NoPrimeEdit,
}

impl EditStatus {
    /// Positive evidence always wins; negative evidence only settles an uncallable edit.
    pub fn transition(self, evidence: Evidence) -> EditStatus {
        match (self, evidence) {
            (_, Evidence::Indel) => EditStatus::HasIndel,
            (_, Evidence::PrimeEdit) => EditStatus::HasPrimeEdit,
            (EditStatus::Uncallable, Evidence::NoIndel) => EditStatus::NoIndel,
            (EditStatus::Uncallable, Evidence::NoPrimeEdit) => EditStatus::NoPrimeEdit,
            (status, _) => status,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EditStatus::Uncallable => "uncallable",
            EditStatus::NoIndel => "no_indel",
            EditStatus::HasIndel => "has_indel",
            EditStatus::NoPrimeEdit => "no_prime_edit",
            EditStatus::HasPrimeEdit => "has_prime_edit",
        }
    }
}

impl fmt::Display for EditStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EditStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uncallable" => Ok(EditStatus::Uncallable),
            "no_indel" => Ok(EditStatus::NoIndel),
            "has_indel" => Ok(EditStatus::HasIndel),
            "no_prime_edit" => Ok(EditStatus::NoPrimeEdit),
            "has_prime_edit" => Ok(EditStatus::HasPrimeEdit),
            _ => Err(format!("Invalid edit status: {}", s)),
        }
    }
}

/// Running call and indel count for one edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditTally {
    pub status: EditStatus,
    pub indel_count: u64,
}

impl EditTally {
    pub fn record(&mut self, evidence: Evidence) {
        self.status = self.status.transition(evidence);
        if evidence == Evidence::Indel {
            self.indel_count += 1;
        }
    }
}
