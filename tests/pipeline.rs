use bibshorts::{
    BibtexParser, Collection, CollectionConfig, CompletenessWarning, Enricher, RecordParser,
    Response, Source, SourceDescriptor, SourceError, Transport, read_inputs,
};
use bibshorts::sources::ScholarSession;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::fs;

/// Serves canned responses; every other URL is unreachable.
struct CannedTransport(HashMap<&'static str, &'static str>);

impl Transport for CannedTransport {
    fn get(&self, url: &str, _headers: &[(&str, &str)]) -> Result<Response, SourceError> {
        self.0
            .get(url)
            .map(|body| Response::new(200, *body))
            .ok_or_else(|| SourceError::Transport(format!("unreachable: {}", url)))
    }
}

const LOCAL: &str = r#"
@article{hopper1952,
  author = {Hopper, Grace},
  title = {The Education of a Computer},
  doi = {10.1145/609784.609818},
}

@book{knuth,
  author = {Knuth, Donald E.},
  isbn = {978-0-201-89683-1},
}
"#;

const REMOTE: &str = r#"
@article{copy,
  author = {Hopper, Grace},
  title = {The Education of a Computer},
  doi = {10.1145/609784.609818},
}

@misc{untitled,
  note = {nobody wrote this},
}
"#;

fn enricher() -> Enricher {
    let mut canned = HashMap::new();
    canned.insert(
        "https://dx.doi.org/10.1145/609784.609818",
        "@inproceedings{Hopper_1952, title={The education of a computer}, booktitle={Proceedings of the 1952 ACM national meeting}, year={1952}, pages={243--249}}",
    );
    canned.insert(
        "https://openlibrary.org/api/books?bibkeys=ISBN:9780201896831&format=json&jscmd=data",
        r#"{"ISBN:9780201896831": {"title": "The Art of Computer Programming", "authors": [{"name": "Donald Knuth"}], "publishers": [{"name": "Addison-Wesley"}], "publish_places": [{"name": "Reading, Mass."}], "publish_date": "1997"}}"#,
    );
    Enricher::new(CannedTransport(canned)).with_session(ScholarSession::with_id("00000000deadbeef"))
}

#[test]
fn test_directory_batch_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("1-local.bib"), LOCAL).unwrap();
    fs::write(dir.path().join("2-remote.bib"), REMOTE).unwrap();

    let config = CollectionConfig::default().with_sources(vec![
        SourceDescriptor::new(Source::DxDoi, false),
        SourceDescriptor::new(Source::GoogleScholar, true),
        SourceDescriptor::new(Source::Isbn, false),
    ]);
    let mut collection = Collection::new().with_config(config);

    let inputs = read_inputs(dir.path()).unwrap();
    let inserted = collection.ingest_batch(&inputs, &enricher());
    assert_eq!(inserted, 3);

    let warnings = collection.finalize();
    assert_eq!(collection.keys(), vec!["Hopper_only.1952", "Knuth_only.1997"]);
    assert_eq!(
        warnings,
        vec![CompletenessWarning::MissingFields {
            key: "Hopper_only.1952".to_string(),
            missing: vec!["journal", "volume", "number"],
        }]
    );

    let hopper = &collection.records()[0];
    assert_eq!(hopper.entry_type, "article");
    assert_eq!(hopper.fields.get("title"), Some("The Education of a Computer"));
    assert_eq!(hopper.fields.get("pages"), Some("243--249"));
    assert_eq!(hopper.search_successes, vec![Source::DxDoi]);

    let knuth = &collection.records()[1];
    assert_eq!(knuth.fields.get("publisher"), Some("Addison-Wesley"));
    assert_eq!(knuth.fields.get("address"), Some("Reading, Mass."));
    assert_eq!(knuth.fields.get("isbn"), Some("978-0-201-89683-1"));
    assert_eq!(knuth.search_successes, vec![Source::Isbn]);

    let output = collection.to_bibtex();
    let reparsed = BibtexParser::new().parse(&output).unwrap();
    assert_eq!(reparsed.len(), 2);
    assert_eq!(reparsed[1].fields, knuth.fields);

    assert_eq!(
        collection.export_summary().unwrap(),
        "Hopper_only.1952;Hopper, Grace;1952;The Education of a Computer\n\
         Knuth_only.1997;Knuth, Donald E.;1997;The Art of Computer Programming\n"
    );
}
