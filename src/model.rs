use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEntry {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// One roster entry. `contacts` is positional: father, mother, then the
/// student's own contact details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
    pub name: String,
    pub id: String,
    pub gender: Gender,
    pub program: String,
    pub batch: String,
    #[serde(rename = "signature")]
    pub signature_image_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
    #[serde(rename = "parents")]
    pub contacts: [ContactEntry; 3],
}

impl StudentRecord {
    /// The PIN to compare against, if one is set. Blank counts as unset.
    pub fn configured_pin(&self) -> Option<&str> {
        self.pin.as_deref().filter(|p| !p.trim().is_empty())
    }

    pub fn display_label(&self) -> String {
        format!("{} ({})", self.name, self.id)
    }
}

#[cfg(test)]
pub(crate) fn sample_record(name: &str, pin: Option<&str>) -> StudentRecord {
    let contact = |who: &str| ContactEntry {
        name: format!("{who} of {name}"),
        email: format!("{}@example.org", who.to_ascii_lowercase()),
        phone: "9000000000".to_string(),
    };
    StudentRecord {
        uid: String::new(),
        name: name.to_string(),
        id: format!("ID-{name}"),
        gender: Gender::Male,
        program: "CSE".to_string(),
        batch: "2023-2027".to_string(),
        signature_image_ref: format!("signatures/{name}.png"),
        pin: pin.map(str::to_string),
        contacts: [
            contact("Father"),
            contact("Mother"),
            ContactEntry {
                name: name.to_string(),
                email: format!("{}@student.example.org", name.to_ascii_lowercase()),
                phone: "9111111111".to_string(),
            },
        ],
    }
}
