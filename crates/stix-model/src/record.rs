//! Flat records extracted from the upload document.

use serde::{Deserialize, Serialize};

use crate::document::{NodeId, SourcePosition};

/// Structural shape of a school's `Students` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StudentListShape {
    /// `Students` element with zero or more `Student` children.
    Present,
    /// No `Students` element at all.
    Absent,
    /// `Students` element carrying text but no `Student` children.
    NotACollection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchoolRecord {
    /// The `School` element this record was read from.
    pub node: NodeId,
    pub position: SourcePosition,
    pub school_number: String,
    pub name: String,
    pub student_list: StudentListShape,
    pub students: Vec<StudentRecord>,
}

impl SchoolRecord {
    pub fn student_count(&self) -> usize {
        match self.student_list {
            StudentListShape::Present => self.students.len(),
            StudentListShape::Absent | StudentListShape::NotACollection => 0,
        }
    }
}

/// One student, flattened. Missing fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StudentRecord {
    pub school_name: String,
    pub school_number: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub alias_first_name: String,
    pub alias_middle_name: String,
    pub alias_last_name: String,
    pub birth_date: String,
    pub grade: String,
    pub class: String,
    #[serde(rename = "OEN")]
    pub oen: String,
    pub gender: String,
    pub language: String,
    pub country_of_origin: String,
    pub unit: String,
    pub street_number: String,
    pub street_number_suffix: String,
    pub street_name: String,
    pub street_type: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    /// Every phone field of the student, `; `-joined in document order.
    pub phones: String,
}

/// Upload metadata block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub create_date: String,
    pub create_time: String,
    pub created_by: String,
    pub contact_number: String,
    pub contact_email: String,
    pub full_upload: String,
    pub board_number: String,
    pub board_name: String,
}
