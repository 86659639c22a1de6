//! End-to-end tests for the rowmill extraction engine.
//!
//! Three fixture recipes cover the main input shapes: a delimited text table
//! with discovered, translated headers; a structured JSON grid with
//! pre-declared headers; and a free-form text format that fans out into two
//! tables through nested dispatch.

use convert_case::{Case, Casing};
use regex::Regex;

use rowmill::{
    computed, DataRecord, FieldCursor, FieldValue, HandlerRegistry, HeaderMap, NdjsonWriter,
    ParseError, Recipe, RecipeError, RowParser, SharedTables, TableSet,
};

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn srow(pairs: &[(&str, &str)]) -> DataRecord {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), FieldValue::from(*v)))
        .collect()
}

// ---------------------------------------------------------------------------
// People: pipe-delimited text, headers discovered from the first line and
// translated, link column unwrapped by an override handler.
// ---------------------------------------------------------------------------

struct PeopleRecipe;

impl Recipe for PeopleRecipe {
    type Raw = String;
    type Table = Vec<String>;
    type Record = String;
    type Field = String;

    fn table_name(&self) -> &str {
        "People"
    }

    fn header_map(&self) -> HeaderMap {
        HeaderMap::new()
            .with_translation("Имя", "Name")
            .with_translation("Возраст", "Age")
            .with_translation("Класс", "Class")
            .with_translation("Ссылка", "Link")
    }

    fn configure(&self, registry: &mut HandlerRegistry<Self>) -> Result<(), RecipeError> {
        registry.override_field(
            "Link",
            Box::new(|_recipe: &Self, cursor: &FieldCursor<'_, Self>| {
                Ok(FieldValue::from(cursor.field.trim_start_matches("href=")))
            }),
        )
    }

    fn table_from_raw(&self, raw: String) -> Result<Vec<String>, ParseError> {
        let lines = Regex::new(r"\r?\n").map_err(ParseError::source)?;
        Ok(lines
            .split(&raw)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn find_headers(&self, table: &Vec<String>) -> Option<Vec<String>> {
        table
            .first()
            .map(|line| line.split('|').map(str::to_string).collect())
    }

    fn find_records(&self, table: &Vec<String>) -> Result<Vec<String>, ParseError> {
        Ok(table.iter().skip(1).cloned().collect())
    }

    fn find_fields(&self, record: &String) -> Result<Vec<String>, ParseError> {
        Ok(record.split('|').map(str::to_string).collect())
    }

    fn field_value(&self, cursor: &FieldCursor<'_, Self>) -> Result<FieldValue, ParseError> {
        Ok(FieldValue::from(cursor.field.as_str()))
    }
}

const PEOPLE_RAW: &str = "\
Имя|Возраст|Класс|Ссылка
Данил|16|11|href=https://localhost:8080/danil
Настя|15|9|href=https://localhost:8081/nastya
";

#[test]
fn people_headers_translate_and_override_applies() {
    init_tracing();

    let parser = RowParser::new(PeopleRecipe).unwrap();
    let tables = parser.parse(PEOPLE_RAW.to_string()).unwrap();

    let mut expected = TableSet::new();
    expected.push(
        "People",
        srow(&[
            ("Name", "Данил"),
            ("Age", "16"),
            ("Class", "11"),
            ("Link", "https://localhost:8080/danil"),
        ]),
    );
    expected.push(
        "People",
        srow(&[
            ("Name", "Настя"),
            ("Age", "15"),
            ("Class", "9"),
            ("Link", "https://localhost:8081/nastya"),
        ]),
    );

    assert_eq!(tables.snapshot(), expected);
}

#[test]
fn people_empty_input_leaves_no_table() {
    let parser = RowParser::new(PeopleRecipe).unwrap();
    // Header line only: zero records, so the table entry is removed.
    let tables = parser.parse("Имя|Возраст|Класс|Ссылка\n".to_string()).unwrap();

    assert!(tables.borrow().is_empty());
}

#[test]
fn people_accumulate_across_inputs() {
    let parser = RowParser::new(PeopleRecipe).unwrap();
    parser.parse(PEOPLE_RAW.to_string()).unwrap();
    parser.parse(PEOPLE_RAW.to_string()).unwrap();

    assert_eq!(parser.tables().borrow().get("People").unwrap().len(), 4);
}

// ---------------------------------------------------------------------------
// Numbers: a JSON grid with no headers of its own; the pre-declared list
// assigns columns positionally.
// ---------------------------------------------------------------------------

struct NumbersRecipe;

impl Recipe for NumbersRecipe {
    type Raw = String;
    type Table = Vec<Vec<i64>>;
    type Record = Vec<i64>;
    type Field = i64;

    fn table_name(&self) -> &str {
        "Numbers"
    }

    fn header_map(&self) -> HeaderMap {
        HeaderMap::new().with_prepared(["One", "Two", "Three"])
    }

    fn table_from_raw(&self, raw: String) -> Result<Vec<Vec<i64>>, ParseError> {
        serde_json::from_str(&raw).map_err(ParseError::source)
    }

    fn find_records(&self, table: &Vec<Vec<i64>>) -> Result<Vec<Vec<i64>>, ParseError> {
        Ok(table.clone())
    }

    fn find_fields(&self, record: &Vec<i64>) -> Result<Vec<i64>, ParseError> {
        Ok(record.clone())
    }

    fn field_value(&self, cursor: &FieldCursor<'_, Self>) -> Result<FieldValue, ParseError> {
        Ok(FieldValue::Int(*cursor.field))
    }
}

#[test]
fn numbers_prepared_headers_assign_positionally() {
    let parser = RowParser::new(NumbersRecipe).unwrap();
    let tables = parser.parse("[[1,2,3],[4,5,6],[7,8,9]]".to_string()).unwrap();

    let mut expected = TableSet::new();
    for chunk in [[1i64, 2, 3], [4, 5, 6], [7, 8, 9]] {
        let row: DataRecord = ["One", "Two", "Three"]
            .iter()
            .zip(chunk)
            .map(|(h, n)| (h.to_string(), FieldValue::Int(n)))
            .collect();
        expected.push("Numbers", row);
    }

    assert_eq!(tables.snapshot(), expected);
}

#[test]
fn numbers_malformed_json_propagates() {
    let parser = RowParser::new(NumbersRecipe).unwrap();
    let err = parser.parse("[[1,2".to_string()).unwrap_err();

    assert!(matches!(err, ParseError::Source(_)));
    assert!(std::error::Error::source(&err).is_some());
}

// ---------------------------------------------------------------------------
// Articles: free-form legal-citation text. The rewritten table is split into
// records and fields, headers come entirely from the `==` splitter, a
// constant ID column links parents to the nested clause table.
// ---------------------------------------------------------------------------

struct ClausesRecipe;

impl Recipe for ClausesRecipe {
    type Raw = String;
    type Table = String;
    type Record = String;
    type Field = String;

    fn table_name(&self) -> &str {
        "Clauses"
    }

    fn header_map(&self) -> HeaderMap {
        HeaderMap::new().with_prepared(["Clause"])
    }

    fn configure(&self, registry: &mut HandlerRegistry<Self>) -> Result<(), RecipeError> {
        registry.computed_field("ID", computed::constant(FieldValue::Int(2)))
    }

    fn table_from_raw(&self, raw: String) -> Result<String, ParseError> {
        Ok(raw)
    }

    fn find_records(&self, table: &String) -> Result<Vec<String>, ParseError> {
        Ok(table.split(',').map(str::to_string).collect())
    }

    fn find_fields(&self, record: &String) -> Result<Vec<String>, ParseError> {
        Ok(vec![record.clone()])
    }

    fn field_value(&self, cursor: &FieldCursor<'_, Self>) -> Result<FieldValue, ParseError> {
        Ok(FieldValue::from(cursor.field.as_str()))
    }
}

struct ArticlesRecipe;

impl Recipe for ArticlesRecipe {
    type Raw = String;
    type Table = String;
    type Record = String;
    type Field = String;

    fn table_name(&self) -> &str {
        "Articles"
    }

    fn configure(&self, registry: &mut HandlerRegistry<Self>) -> Result<(), RecipeError> {
        registry.computed_field("ID", computed::constant(FieldValue::Int(1)))?;
        registry.nested_table("Clauses", ClausesRecipe)?;
        Ok(())
    }

    fn table_from_raw(&self, raw: String) -> Result<String, ParseError> {
        Ok(raw
            .replace(';', "//")
            .replace("ст.", "Article==")
            .replace("ч.", "/Part==")
            .replace("п.", "/Clauses=="))
    }

    fn find_records(&self, table: &String) -> Result<Vec<String>, ParseError> {
        Ok(table.split("//").map(str::to_string).collect())
    }

    fn find_fields(&self, record: &String) -> Result<Vec<String>, ParseError> {
        Ok(record.split('/').map(str::to_string).collect())
    }

    fn split_header_field(&self, field: &String) -> Option<(String, String)> {
        field
            .split_once("==")
            .map(|(h, v)| (h.to_string(), v.to_string()))
    }

    fn field_value(&self, cursor: &FieldCursor<'_, Self>) -> Result<FieldValue, ParseError> {
        Ok(FieldValue::from(cursor.field.as_str()))
    }
}

#[test]
fn articles_nested_dispatch_fans_out() {
    init_tracing();

    let parser = RowParser::new(ArticlesRecipe).unwrap();
    let tables = parser.parse("ст. 228 ч. 1 п. 5, 6, а, б".to_string()).unwrap();

    let mut expected = TableSet::new();
    let mut parent = srow(&[("Article", " 228 "), ("Part", " 1 ")]);
    parent.insert("ID".to_string(), FieldValue::Int(1));
    expected.push("Articles", parent);
    for clause in [" 5", " 6", " а", " б"] {
        let mut row = srow(&[("Clause", clause)]);
        row.insert("ID".to_string(), FieldValue::Int(2));
        expected.push("Clauses", row);
    }

    assert_eq!(tables.snapshot(), expected);
}

#[test]
fn articles_parent_rows_never_hold_the_nested_header() {
    let parser = RowParser::new(ArticlesRecipe).unwrap();
    let tables = parser.parse("ст. 228 ч. 1 п. 5, 6".to_string()).unwrap();

    let set = tables.snapshot();
    for row in set.get("Articles").unwrap() {
        assert!(row.get("Clauses").is_none());
    }
    assert_eq!(set.get("Clauses").unwrap().len(), 2);
}

#[test]
fn articles_multiple_records_accumulate_both_tables() {
    let parser = RowParser::new(ArticlesRecipe).unwrap();
    let tables = parser
        .parse("ст. 228 ч. 1 п. 5, 6, а, б; ст. 337 ч. 2".to_string())
        .unwrap();

    let set = tables.snapshot();
    let articles = set.get("Articles").unwrap();
    assert_eq!(articles.len(), 2);
    assert_eq!(set.get("Clauses").unwrap().len(), 4);

    // The splitter keeps raw spacing as-is, quirks included: the second
    // record starts with a space, so its article header carries one too.
    assert_eq!(articles[1].get(" Article"), Some(&FieldValue::from(" 337 ")));
    assert_eq!(articles[1].get("ID"), Some(&FieldValue::Int(1)));

    // Constant IDs are the fixture's only parent/clause linkage:
    // 1 for articles, 2 for clauses.
    assert!(articles.iter().all(|r| r.get("ID") == Some(&FieldValue::Int(1))));
    assert!(set
        .get("Clauses")
        .unwrap()
        .iter()
        .all(|r| r.get("ID") == Some(&FieldValue::Int(2))));
}

// ---------------------------------------------------------------------------
// Samples: `a=1, b=2, ...` pairs, numeric defaults with one textual override.
// ---------------------------------------------------------------------------

struct SamplesRecipe {
    record_split: Regex,
    field_split: Regex,
}

impl SamplesRecipe {
    fn new() -> Self {
        Self {
            record_split: Regex::new(r";\s*").unwrap(),
            field_split: Regex::new(r",\s*").unwrap(),
        }
    }
}

impl Recipe for SamplesRecipe {
    type Raw = String;
    type Table = String;
    type Record = String;
    type Field = String;

    fn table_name(&self) -> &str {
        "Samples"
    }

    fn configure(&self, registry: &mut HandlerRegistry<Self>) -> Result<(), RecipeError> {
        registry.override_field(
            "d",
            Box::new(|_recipe: &Self, cursor: &FieldCursor<'_, Self>| {
                Ok(FieldValue::String(cursor.field.to_case(Case::Title)))
            }),
        )
    }

    fn table_from_raw(&self, raw: String) -> Result<String, ParseError> {
        Ok(raw)
    }

    fn find_records(&self, table: &String) -> Result<Vec<String>, ParseError> {
        Ok(self.record_split.split(table).map(str::to_string).collect())
    }

    fn find_fields(&self, record: &String) -> Result<Vec<String>, ParseError> {
        Ok(self.field_split.split(record).map(str::to_string).collect())
    }

    fn split_header_field(&self, field: &String) -> Option<(String, String)> {
        field
            .split_once('=')
            .map(|(h, v)| (h.to_string(), v.to_string()))
    }

    fn field_value(&self, cursor: &FieldCursor<'_, Self>) -> Result<FieldValue, ParseError> {
        cursor
            .field
            .parse::<i64>()
            .map(FieldValue::Int)
            .map_err(ParseError::source)
    }
}

#[test]
fn samples_override_beats_default_handler() {
    let parser = RowParser::new(SamplesRecipe::new()).unwrap();
    let raw = "a=1, b=2, c=3, d=small numbers; a=100, b=200, c=300, d=big numbers";
    let tables = parser.parse(raw.to_string()).unwrap();

    let mut expected = TableSet::new();
    for (a, b, c, d) in [(1, 2, 3, "Small Numbers"), (100, 200, 300, "Big Numbers")] {
        let mut row = DataRecord::new();
        row.insert("a".to_string(), FieldValue::Int(a));
        row.insert("b".to_string(), FieldValue::Int(b));
        row.insert("c".to_string(), FieldValue::Int(c));
        row.insert("d".to_string(), FieldValue::from(d));
        expected.push("Samples", row);
    }

    assert_eq!(tables.snapshot(), expected);
}

#[test]
fn samples_field_failure_keeps_earlier_rows() {
    let parser = RowParser::new(SamplesRecipe::new()).unwrap();
    let err = parser
        .parse("a=1, d=ok; a=oops, d=bad".to_string())
        .unwrap_err();

    assert!(matches!(err, ParseError::Source(_)));
    // The first record was appended before the failure and stays.
    assert_eq!(parser.tables().borrow().get("Samples").unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Cross-recipe behavior.
// ---------------------------------------------------------------------------

#[test]
fn shared_result_accumulates_across_parsers() {
    let shared = SharedTables::new();

    let mut people = RowParser::new(PeopleRecipe).unwrap();
    people.bind(shared.clone());
    let mut numbers = RowParser::new(NumbersRecipe).unwrap();
    numbers.bind(shared.clone());

    let returned = people.parse(PEOPLE_RAW.to_string()).unwrap();
    numbers.parse("[[1,2,3]]".to_string()).unwrap();

    assert!(returned.ptr_eq(&shared));

    let set = shared.snapshot();
    let names: Vec<&str> = set.table_names().collect();
    assert_eq!(names, vec!["People", "Numbers"]);
    assert_eq!(set.get("People").unwrap().len(), 2);
    assert_eq!(set.get("Numbers").unwrap().len(), 1);

    // No cross-contamination between the two recipes' columns.
    assert!(set.get("People").unwrap()[0].get("One").is_none());
    assert!(set.get("Numbers").unwrap()[0].get("Name").is_none());
}

#[test]
fn ndjson_export_of_a_parse_result() {
    use std::io::Read;

    let parser = RowParser::new(ArticlesRecipe).unwrap();
    let tables = parser.parse("ст. 228 ч. 1 п. 5, 6, а, б".to_string()).unwrap();

    let file = tempfile::NamedTempFile::new().unwrap();
    let mut writer = NdjsonWriter::new(file.reopen().unwrap());
    writer.write_table_set(&tables.borrow()).unwrap();
    writer.flush().unwrap();

    let mut contents = String::new();
    file.reopen().unwrap().read_to_string(&mut contents).unwrap();

    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with(r#"{"table":"Articles""#));
    assert!(lines.iter().skip(1).all(|l| l.starts_with(r#"{"table":"Clauses""#)));
}
