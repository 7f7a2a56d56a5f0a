//! CSV exports of the student roster.
//!
//! Four files share a base path: all students, students matching the birth
//! year and grade filter, students per school and birth year, and students
//! per school and grade. Files are UTF-8 with a byte-order mark so that
//! spreadsheet tools pick the right encoding.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use stix_model::{SchoolRecord, StudentRecord};
use tracing::{info, info_span};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const STUDENT_COLUMNS: [&str; 25] = [
    "SchoolName",
    "SchoolNumber",
    "FirstName",
    "MiddleName",
    "LastName",
    "AliasFirstName",
    "AliasMiddleName",
    "AliasLastName",
    "BirthDate",
    "BirthYear",
    "Grade",
    "Class",
    "OEN",
    "Gender",
    "Language",
    "CountryOfOrigin",
    "Unit",
    "StreetNumber",
    "StreetNumberSuffix",
    "StreetName",
    "StreetType",
    "City",
    "Province",
    "PostalCode",
    "Phones",
];

const SCHOOL_COUNT_COLUMNS: [&str; 3] = ["SchoolName", "BirthYear", "StudentCount"];
const GRADE_COUNT_COLUMNS: [&str; 3] = ["SchoolName", "Grade", "GradeCount"];

/// Filter for the `_filtered_students` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub birth_years: Vec<i32>,
    pub grades: Vec<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            birth_years: vec![2012, 2013],
            grades: vec!["GR7".to_string(), "GR8".to_string()],
        }
    }
}

impl ExportOptions {
    pub fn matches(&self, student: &StudentRecord) -> bool {
        birth_year(&student.birth_date).is_some_and(|year| self.birth_years.contains(&year))
            && self.grades.iter().any(|grade| grade == student.grade.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SchoolYearCount {
    pub school_name: String,
    pub birth_year: i32,
    pub student_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GradeCount {
    pub school_name: String,
    pub grade: String,
    pub grade_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFiles {
    pub all_students: PathBuf,
    pub filtered_students: PathBuf,
    pub school_counts: PathBuf,
    pub grade_counts: PathBuf,
}

impl ExportFiles {
    /// `<base>_all_students.csv` and siblings. An extension on `base` is dropped.
    pub fn for_base(base: &Path) -> Self {
        let stem = base.with_extension("");
        let name = stem
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let sibling = |suffix: &str| stem.with_file_name(format!("{name}_{suffix}.csv"));
        Self {
            all_students: sibling("all_students"),
            filtered_students: sibling("filtered_students"),
            school_counts: sibling("school_counts"),
            grade_counts: sibling("grade_counts"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub files: ExportFiles,
    /// Distinct non-empty school names.
    pub schools: usize,
    pub students: usize,
    pub filtered_students: usize,
    /// Students per birth year; unparsable dates are left out.
    pub birth_years: BTreeMap<i32, usize>,
    pub grades: BTreeMap<String, usize>,
    pub filtered_grades: BTreeMap<String, usize>,
    pub filtered_schools: Vec<String>,
}

/// Year of a `YYYY-MM-DD` birth date, ignoring any time part.
pub fn birth_year(birth_date: &str) -> Option<i32> {
    let date = birth_date.trim().get(..10)?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .map(|date| date.year())
}

/// Students per school and birth year, sorted by school then year.
pub fn school_counts(students: &[&StudentRecord]) -> Vec<SchoolYearCount> {
    let mut counts: BTreeMap<(&str, i32), usize> = BTreeMap::new();
    for student in students {
        if let Some(year) = birth_year(&student.birth_date) {
            *counts.entry((student.school_name.as_str(), year)).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .map(|((school_name, birth_year), student_count)| SchoolYearCount {
            school_name: school_name.to_string(),
            birth_year,
            student_count,
        })
        .collect()
}

/// Students per school and grade; students without a grade are left out.
pub fn grade_counts(students: &[&StudentRecord]) -> Vec<GradeCount> {
    let mut counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for student in students {
        let grade = student.grade.trim();
        if !grade.is_empty() {
            *counts.entry((student.school_name.as_str(), grade)).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .map(|((school_name, grade), grade_count)| GradeCount {
            school_name: school_name.to_string(),
            grade: grade.to_string(),
            grade_count,
        })
        .collect()
}

/// Write the four CSV exports for `schools` next to `base`.
pub fn export_students(
    schools: &[SchoolRecord],
    base: &Path,
    options: &ExportOptions,
) -> Result<ExportSummary> {
    let _span = info_span!("export", base = %base.display()).entered();
    let files = ExportFiles::for_base(base);
    if let Some(parent) = files.all_students.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }

    let students: Vec<&StudentRecord> = schools
        .iter()
        .flat_map(|school| school.students.iter())
        .collect();
    let filtered: Vec<&StudentRecord> = students
        .iter()
        .copied()
        .filter(|student| options.matches(student))
        .collect();

    write_students(&files.all_students, &students)?;
    write_students(&files.filtered_students, &filtered)?;
    write_rows(&files.school_counts, &SCHOOL_COUNT_COLUMNS, &school_counts(&students))?;
    write_rows(&files.grade_counts, &GRADE_COUNT_COLUMNS, &grade_counts(&students))?;

    let summary = ExportSummary {
        schools: students
            .iter()
            .map(|student| student.school_name.as_str())
            .filter(|name| !name.is_empty())
            .collect::<BTreeSet<_>>()
            .len(),
        students: students.len(),
        filtered_students: filtered.len(),
        birth_years: tally(students.iter().filter_map(|s| birth_year(&s.birth_date))),
        grades: tally(nonempty_grades(&students)),
        filtered_grades: tally(nonempty_grades(&filtered)),
        filtered_schools: filtered
            .iter()
            .map(|student| student.school_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
        files,
    };
    info!(
        students = summary.students,
        filtered = summary.filtered_students,
        "wrote student exports"
    );
    Ok(summary)
}

fn nonempty_grades<'a>(students: &'a [&StudentRecord]) -> impl Iterator<Item = String> + 'a {
    students
        .iter()
        .map(|student| student.grade.trim())
        .filter(|grade| !grade.is_empty())
        .map(str::to_string)
}

fn tally<K: Ord>(keys: impl Iterator<Item = K>) -> BTreeMap<K, usize> {
    let mut counts = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }
    counts
}

fn create_with_bom(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(UTF8_BOM)
        .with_context(|| format!("write {}", path.display()))?;
    Ok(writer)
}

fn write_students(path: &Path, students: &[&StudentRecord]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(create_with_bom(path)?);
    csv.write_record(STUDENT_COLUMNS)?;
    for student in students {
        let year = birth_year(&student.birth_date)
            .map(|year| year.to_string())
            .unwrap_or_default();
        let fields: [&str; 25] = [
            &student.school_name,
            &student.school_number,
            &student.first_name,
            &student.middle_name,
            &student.last_name,
            &student.alias_first_name,
            &student.alias_middle_name,
            &student.alias_last_name,
            &student.birth_date,
            &year,
            &student.grade,
            &student.class,
            &student.oen,
            &student.gender,
            &student.language,
            &student.country_of_origin,
            &student.unit,
            &student.street_number,
            &student.street_number_suffix,
            &student.street_name,
            &student.street_type,
            &student.city,
            &student.province,
            &student.postal_code,
            &student.phones,
        ];
        csv.write_record(fields)?;
    }
    csv.flush()
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Header written up front so that an empty table still has one.
fn write_rows<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(create_with_bom(path)?);
    csv.write_record(header)?;
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
