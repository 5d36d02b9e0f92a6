//! US state name utilities.
//!
//! ACS labels geographies with full state names ("Hennepin County,
//! Minnesota") while HUD uses two-letter postal abbreviations ("Hennepin
//! County, MN"). This table bridges the two for key normalization.

/// Two-letter postal abbreviation and full name for the 50 US states + DC.
pub const STATES: &[(&str, &str)] = &[
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

/// Maps a two-letter state abbreviation (any case) to the full state name.
///
/// Returns `None` for unrecognized abbreviations.
#[must_use]
pub fn state_name(abbr: &str) -> Option<&'static str> {
    STATES
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(abbr))
        .map(|(_, name)| *name)
}

/// Maps a full state name (any case) to its two-letter abbreviation.
#[must_use]
pub fn state_abbr(name: &str) -> Option<&'static str> {
    STATES
        .iter()
        .find(|(_, full)| full.eq_ignore_ascii_case(name))
        .map(|(code, _)| *code)
}
