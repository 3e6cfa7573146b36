use headnote_core::db::open_db_in_memory;
use headnote_core::{
    enforce, primary_repository, Document, NoteRecord, NoteRepository, RepoError,
    SqliteNoteRepository, SINGLETON_NOTE_ID,
};

fn record(text: &str, last_modified: i64) -> NoteRecord {
    let mut content = Document::from_text(text);
    enforce(&mut content);
    let plain = content.plain_text();
    NoteRecord::from_content(SINGLETON_NOTE_ID, content, &plain, last_modified)
}

#[test]
fn get_missing_note_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::new(&conn);

    assert!(repo.get_note(SINGLETON_NOTE_ID).unwrap().is_none());
}

#[test]
fn put_note_creates_then_overwrites_single_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::new(&conn);

    repo.put_note(&record("First draft\nbody", 10)).unwrap();
    let second = record("Second draft\nnew body", 20);
    repo.put_note(&second).unwrap();

    let loaded = repo.get_note(SINGLETON_NOTE_ID).unwrap().unwrap();
    assert_eq!(loaded, second);
    assert_eq!(loaded.title, "Second draft");

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn content_column_holds_delta_json() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::new(&conn);
    repo.put_note(&record("Title", 1)).unwrap();

    let raw: String = conn
        .query_row("SELECT content FROM notes;", [], |row| row.get(0))
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "ops": [
                {"insert": "Title"},
                {"insert": "\n", "attributes": {"header": 1}}
            ]
        })
    );
}

#[test]
fn null_content_column_reads_as_none() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO notes (id, title, content, last_modified) VALUES (?1, '', NULL, 5);",
        [SINGLETON_NOTE_ID.to_string()],
    )
    .unwrap();
    let repo = SqliteNoteRepository::new(&conn);

    let loaded = repo.get_note(SINGLETON_NOTE_ID).unwrap().unwrap();
    assert_eq!(loaded.content, None);
    assert_eq!(loaded.last_modified, 5);
}

#[test]
fn undecodable_content_is_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO notes (id, title, content, last_modified) VALUES (?1, 't', 'not json', 5);",
        [SINGLETON_NOTE_ID.to_string()],
    )
    .unwrap();
    let repo = SqliteNoteRepository::new(&conn);

    let err = repo.get_note(SINGLETON_NOTE_ID).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn write_to_dropped_table_surfaces_db_error() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("DROP TABLE notes;").unwrap();
    let repo = SqliteNoteRepository::new(&conn);

    let err = repo.put_note(&record("Title", 1)).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
}

#[test]
fn failed_open_yields_repository_reporting_the_failure() {
    let dir = tempfile::tempdir().unwrap();
    let opened = headnote_core::db::open_db(dir.path());
    assert!(opened.is_err());

    let repo = primary_repository(&opened);

    assert!(matches!(
        repo.get_note(SINGLETON_NOTE_ID),
        Err(RepoError::Unavailable(_))
    ));
    assert!(matches!(
        repo.put_note(&record("Title", 1)),
        Err(RepoError::Unavailable(_))
    ));
}
