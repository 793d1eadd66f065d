//! Consent document model. The shell turns this into printable markup; the
//! sidecar only decides what goes into it.

use serde::Serialize;

use crate::model::{Gender, StudentRecord};

/// Resolved student plus trip parameters, ready for a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentInput {
    pub student: StudentRecord,
    /// `D.M.YYYY`
    pub out_date: String,
    /// `D.M.YYYY`
    pub in_date: String,
    /// `D-M-YYYY`
    pub today: String,
    pub outing_type: String,
}

pub trait DocumentRenderer {
    type Output;

    fn render(&self, input: &ConsentInput) -> Self::Output;
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContactRow {
    pub role: &'static str,
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConsentLetter {
    pub honorific: &'static str,
    pub ward_relation: &'static str,
    pub student_name: String,
    pub student_id: String,
    pub program: String,
    pub batch: String,
    pub out_date: String,
    pub in_date: String,
    pub outing_type: String,
    pub date_stamp: String,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConsentDocument {
    pub student_uid: String,
    pub letter: ConsentLetter,
    pub contacts: Vec<ContactRow>,
}

const CONTACT_ROLES: [&str; 3] = ["Father", "Mother", "Student"];

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsentModelRenderer;

impl DocumentRenderer for ConsentModelRenderer {
    type Output = ConsentDocument;

    fn render(&self, input: &ConsentInput) -> ConsentDocument {
        let s = &input.student;
        let (honorific, ward_relation) = match s.gender {
            Gender::Female => ("Ms.", "daughter"),
            Gender::Male => ("Mr.", "son"),
        };
        let contacts = CONTACT_ROLES
            .iter()
            .zip(s.contacts.iter())
            .map(|(&role, c)| ContactRow {
                role,
                name: c.name.clone(),
                email: c.email.clone(),
                phone: c.phone.clone(),
            })
            .collect();

        ConsentDocument {
            student_uid: s.uid.clone(),
            letter: ConsentLetter {
                honorific,
                ward_relation,
                student_name: s.name.clone(),
                student_id: s.id.clone(),
                program: s.program.clone(),
                batch: s.batch.clone(),
                out_date: input.out_date.clone(),
                in_date: input.in_date.clone(),
                outing_type: input.outing_type.clone(),
                date_stamp: input.today.clone(),
                signature: s.signature_image_ref.clone(),
            },
            contacts,
        }
    }
}
