use std::fmt;

/// Engagement answer for one face image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    One,
    Two,
    Three,
    Four,
    Five,
    Unknown,
}

impl Rating {
    pub const ALL: [Rating; 6] = [
        Rating::One,
        Rating::Two,
        Rating::Three,
        Rating::Four,
        Rating::Five,
        Rating::Unknown,
    ];

    /// Wire form stored in the evaluation documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::One => "1",
            Rating::Two => "2",
            Rating::Three => "3",
            Rating::Four => "4",
            Rating::Five => "5",
            Rating::Unknown => "Unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Rating> {
        match s.trim() {
            "1" => Some(Rating::One),
            "2" => Some(Rating::Two),
            "3" => Some(Rating::Three),
            "4" => Some(Rating::Four),
            "5" => Some(Rating::Five),
            "Unknown" => Some(Rating::Unknown),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Rating::One => "Not engaged at all",
            Rating::Two => "Slightly engaged",
            Rating::Three => "Moderately engaged",
            Rating::Four => "Very engaged",
            Rating::Five => "Totally engaged",
            Rating::Unknown => "Unclear image",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One resolved image, ready for presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyImage {
    /// Full filename, e.g. `face2-156_87_270_218.jpg`.
    pub name: String,
    /// Filename stem, `0` for the context image.
    pub file_name: String,
    pub url: String,
    pub dataset: String,
    pub folder: String,
    pub is_context: bool,
}

/// One folder's worth of session content: the annotated overview image plus
/// the face crops to rate. Only complete groups exist.
#[derive(Debug, Clone)]
pub struct Group {
    pub context: SurveyImage,
    pub evaluations: Vec<SurveyImage>,
}

/// One `(dataset, folder)` selection made for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pick {
    pub dataset: String,
    pub folder: String,
}

impl Pick {
    pub fn path(&self) -> String {
        format!("{}/{}", self.dataset, self.folder)
    }
}

pub const GENDERS: &[&str] = &["Male", "Female", "Other", "Rather not say"];

pub const AGE_RANGES: &[&str] = &[
    "Under 18",
    "18-24",
    "25-34",
    "35-44",
    "45-54",
    "55-64",
    "65+",
    "Rather not say",
];

pub const EDUCATIONS: &[&str] = &[
    "No formal education",
    "High school diploma",
    "College degree",
    "Bachelor's degree",
    "Master's degree",
    "Doctorate",
    "Other",
    "Rather not say",
];

pub const PROFESSIONS: &[&str] = &[
    "Student",
    "University Teacher",
    "High School Teacher",
    "Elementary School Teacher",
    "Other",
    "Rather not say",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_round_trips_through_wire_form() {
        for rating in Rating::ALL {
            assert_eq!(Rating::parse(rating.as_str()), Some(rating));
        }
        assert_eq!(Rating::parse("6"), None);
        assert_eq!(Rating::parse(""), None);
    }

    #[test]
    fn pick_path_joins_dataset_and_folder() {
        let pick = Pick {
            dataset: "Lecture_A".to_string(),
            folder: "2021-05-24_10-15".to_string(),
        };
        assert_eq!(pick.path(), "Lecture_A/2021-05-24_10-15");
    }
}
