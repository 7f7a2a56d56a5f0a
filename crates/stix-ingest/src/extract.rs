//! Flat school/student records read from the document tree.

use stix_model::{Document, NodeId, SchoolRecord, StudentListShape, StudentRecord};
use stix_standards::catalog::{self, FieldCatalog};

/// School and student totals of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentCounts {
    pub schools: usize,
    pub students: usize,
}

/// Every `School` element of the document, in document order.
pub fn extract_schools(document: &Document, catalog: &FieldCatalog) -> Vec<SchoolRecord> {
    document
        .iter()
        .filter(|id| catalog.is(document.element(*id), catalog::SCHOOL))
        .map(|id| extract_school(document, catalog, id))
        .collect()
}

/// Count attached schools and their students.
pub fn count_document(document: &Document, catalog: &FieldCatalog) -> DocumentCounts {
    extract_schools(document, catalog)
        .iter()
        .fold(DocumentCounts::default(), |counts, school| DocumentCounts {
            schools: counts.schools + 1,
            students: counts.students + school.student_count(),
        })
}

fn extract_school(document: &Document, catalog: &FieldCatalog, school: NodeId) -> SchoolRecord {
    let reader = FieldReader { document, catalog };
    let school_number = reader.text(school, &[catalog::SCHOOL_NUMBER]);
    let name = reader.text(school, &[catalog::NAME]);

    let (student_list, students) = match reader.child(school, catalog::STUDENTS) {
        None => (StudentListShape::Absent, Vec::new()),
        Some(list) => {
            let students: Vec<StudentRecord> = document
                .children(list)
                .iter()
                .copied()
                .filter(|id| catalog.is(document.element(*id), catalog::STUDENT))
                .map(|id| reader.student(id, &school_number, &name))
                .collect();
            let has_text = document
                .text(list)
                .is_some_and(|text| !text.trim().is_empty());
            if students.is_empty() && has_text {
                (StudentListShape::NotACollection, students)
            } else {
                (StudentListShape::Present, students)
            }
        }
    };

    SchoolRecord {
        node: school,
        position: document.element(school).position.clone(),
        school_number,
        name,
        student_list,
        students,
    }
}

struct FieldReader<'a> {
    document: &'a Document,
    catalog: &'a FieldCatalog,
}

impl FieldReader<'_> {
    fn child(&self, parent: NodeId, local: &str) -> Option<NodeId> {
        self.document
            .find_child(parent, |element| self.catalog.is(element, local))
    }

    /// Trimmed text at `path` below `from`, or an empty string.
    fn text(&self, from: NodeId, path: &[&str]) -> String {
        path.iter()
            .try_fold(from, |current, local| self.child(current, local))
            .and_then(|id| self.document.text(id))
            .map(|text| text.trim().to_string())
            .unwrap_or_default()
    }

    fn student(&self, student: NodeId, school_number: &str, school_name: &str) -> StudentRecord {
        let address = |field: &str| self.text(student, &[catalog::ADDRESS, field]);
        let phones: Vec<String> = self
            .document
            .descendants(student)
            .filter(|id| self.catalog.is_phone(self.document.element(*id)))
            .filter_map(|id| self.document.text(id))
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(String::from)
            .collect();

        StudentRecord {
            school_name: school_name.to_string(),
            school_number: school_number.to_string(),
            first_name: self.text(student, &[catalog::NAME, "First"]),
            middle_name: self.text(student, &[catalog::NAME, "Middle"]),
            last_name: self.text(student, &[catalog::NAME, "Last"]),
            alias_first_name: self.text(student, &[catalog::ALIAS_NAME, "First"]),
            alias_middle_name: self.text(student, &[catalog::ALIAS_NAME, "Middle"]),
            alias_last_name: self.text(student, &[catalog::ALIAS_NAME, "Last"]),
            birth_date: self.text(student, &["BirthDate"]),
            grade: self.text(student, &["Grade"]),
            class: self.text(student, &["Class"]),
            oen: self.text(student, &["OEN"]),
            gender: self.text(student, &["Gender"]),
            language: self.text(student, &["Language"]),
            country_of_origin: self.text(student, &["CountryOfOrigin"]),
            unit: address(catalog::UNIT),
            street_number: address(catalog::STREET_NUMBER),
            street_number_suffix: address("StreetNumberSuffix"),
            street_name: address(catalog::STREET_NAME),
            street_type: address("StreetType"),
            city: address("City"),
            province: address("Province"),
            postal_code: address("PostalCode"),
            phones: phones.join("; "),
        }
    }
}
