use std::fs;
use std::io::Write;
use tempfile::TempDir;

use passage_core::data_processor::DataProcessor;
use passage_core::TextChunker;

#[test]
fn process_directory_single_small_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    let file_path = dir.join("a.txt");
    let mut f = fs::File::create(&file_path).unwrap();
    writeln!(f, "Short text").unwrap();

    let processor = DataProcessor::new();
    let chunks = processor.process_directory(dir).expect("process");

    assert_eq!(chunks.len(), 1, "one small file becomes one chunk");
    assert_eq!(chunks[0].content.trim(), "Short text");
    assert_eq!(chunks[0].id, "a:0");
    assert_eq!(chunks[0].metadata["category"], "misc");
}

#[test]
fn process_directory_limited_two_files_limit_one() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("a.txt"), "alpha bravo").unwrap();
    fs::write(dir.join("b.txt"), "charlie delta").unwrap();

    let processor = DataProcessor::new();
    let chunks = processor
        .process_directory_limited(dir, 1)
        .expect("process limited");

    // Only chunks from one document should be present
    let mut doc_paths = std::collections::HashSet::new();
    for c in &chunks { doc_paths.insert(c.metadata["doc_path"].to_string()); }
    assert_eq!(doc_paths.len(), 1, "limited to one source document");
}

#[test]
fn process_directory_uses_subdirectory_as_category_and_skips_other_files() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir_all(dir.join("policies")).unwrap();
    fs::write(dir.join("policies/returns.txt"), "Items may be returned within 30 days.").unwrap();
    fs::write(dir.join("notes.md"), "ignored").unwrap();
    fs::write(dir.join("empty.txt"), "   ").unwrap();

    let chunks = DataProcessor::new().process_directory(dir).expect("process");
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].metadata["category"], "policies");
    assert_eq!(chunks[0].id, "returns:0");
}

#[test]
fn long_files_are_split_with_overlap() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("long.txt"), "Sentence number one is here. ".repeat(100)).unwrap();

    let processor = DataProcessor::with_chunker(TextChunker::new(500, 100).unwrap()).normalizing(true);
    let chunks = processor.process_directory(dir).expect("process");
    assert!(chunks.len() > 1);
    for c in &chunks {
        assert!(c.content.chars().count() <= 500);
        assert_eq!(c.metadata["document_type"], "text");
        assert_eq!(c.metadata["total_chunks"], chunks.len());
    }
}
