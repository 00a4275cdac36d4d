use listmapper::*;
use pretty_assertions::assert_eq;

const SHOP: &str = r#"
<html><body>
  <div class="product">
    <h2 class="name">  Laptop
    </h2>
    <span class="price">$999.99</span>
    <span class="stock">12</span>
    <span class="tags">new, sale ,  electronics</span>
    <input class="gift" type="checkbox" checked>
    <a class="link" href="/p/laptop">details</a>
  </div>
  <div class="product">
    <h2 class="name">Mouse</h2>
    <span class="price">$29.99</span>
    <span class="stock">0</span>
    <span class="tags"></span>
    <a class="link" href="">details</a>
  </div>
</body></html>
"#;

fn extractor(pairs: &[(&str, &str)]) -> RecordExtractor {
    RecordExtractor::new(pairs.iter().copied().collect())
}

#[test]
fn test_text_is_trimmed() {
    let document = Document::parse("https://shop.example", SHOP);
    let records = extractor(&[("name", "div.product h2.name")]).extract(&document);

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].text("name"), Some("Laptop"));
    assert_eq!(records[1].text("name"), Some("Mouse"));
}

#[test]
fn test_typed_fields() {
    let document = Document::parse("https://shop.example", SHOP);
    let records = extractor(&[
        ("name", "div.product h2.name"),
        ("stock", "div.product span.stock"),
        ("tags", "div.product span.tags"),
    ])
    .extract(&document);

    assert_eq!(records[0].get_as::<u32>("stock").unwrap(), 12);
    assert_eq!(records[1].get_as::<i64>("stock").unwrap(), 0);
    assert_eq!(
        records[0].get_as::<Vec<String>>("tags").unwrap(),
        vec!["new", "sale", "electronics"]
    );
    // Empty span yields the element itself, which parses as empty text
    assert_eq!(records[1].get_as::<Option<String>>("tags").unwrap(), None);
}

#[test]
fn test_parse_error_names_the_field() {
    let document = Document::parse("https://shop.example", SHOP);
    let records = extractor(&[("price", "div.product span.price")]).extract(&document);

    match records[0].get_as::<f64>("price") {
        Err(ExtractionError::ParseError { field, text, .. }) => {
            assert_eq!(field, "price");
            assert_eq!(text, "$999.99");
        }
        other => panic!("Expected ParseError, got {other:?}"),
    }
}

#[test]
fn test_missing_field_lookup() {
    let document = Document::parse("https://shop.example", SHOP);
    let records = extractor(&[("name", "div.product h2.name")]).extract(&document);

    assert!(!records[0].contains("price"));
    assert!(matches!(
        records[0].get_as::<String>("price"),
        Err(ExtractionError::MissingField { .. })
    ));
}

#[test]
fn test_attribute_queries_skip_elements_without_the_attribute() {
    let document = Document::parse("https://shop.example", SHOP);
    let records = extractor(&[
        ("name", "div.product h2.name"),
        ("gift", "div.product input.gift @checked"),
        ("link", "div.product a.link @href"),
    ])
    .extract(&document);

    // The only gift box has an empty `checked` value, so it yields the element
    let gift = records[0].get("gift").and_then(Value::as_node).unwrap();
    assert_eq!(gift.name(), "input");
    assert!(!records[1].contains("gift"));

    assert_eq!(records[0].text("link"), Some("/p/laptop"));
    assert!(records[1].get("link").and_then(Value::as_node).is_some());
}

#[test]
fn test_diagnostics_are_collected() {
    let document = Document::parse("https://shop.example", SHOP);
    let extraction = extractor(&[
        ("name", "div.product h2.name"),
        ("gift", "div.product input.gift @checked"),
        ("broken", "div[[ span"),
    ])
    .extract_detailed(&document);

    assert_eq!(extraction.records().len(), 2);
    let kinds: Vec<_> = extraction
        .errors()
        .iter()
        .map(|error| match error {
            ExtractionError::InvalidQuery { attribute, .. } => format!("query:{attribute}"),
            ExtractionError::MissingField { field, index, .. } => {
                format!("missing:{field}:{index}")
            }
            ExtractionError::ParseError { field, .. } => format!("parse:{field}"),
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "query:broken",
            "missing:broken:0",
            "missing:gift:1",
            "missing:broken:1"
        ]
    );
}

#[test]
fn test_records_serialize_in_attribute_order() {
    let document = Document::parse("https://shop.example", SHOP);
    let records = extractor(&[
        ("price", "div.product span.price"),
        ("name", "div.product h2.name"),
    ])
    .extract(&document);

    let json = serde_json::to_string(&records[1]).unwrap();
    assert_eq!(json, r#"{"price":"$29.99","name":"Mouse"}"#);
}

/// A document backed by a fixed list of elements, to show the engine only
/// needs the query capability
struct FixedDocument {
    nodes: Vec<NodeHandle>,
}

impl QueryDocument for FixedDocument {
    fn select(&self, query: &Query) -> Result<Vec<NodeHandle>, QueryError> {
        Ok(self
            .nodes
            .iter()
            .filter(|node| node.name() == query.selector())
            .filter(|node| query.attribute().is_none_or(|name| node.has_attr(name)))
            .cloned()
            .collect())
    }

    fn closest(&self, _node: &NodeHandle, _kind: &str) -> Option<NodeHandle> {
        None
    }

    fn descendants(&self, _node: &NodeHandle) -> Vec<NodeHandle> {
        Vec::new()
    }
}

#[test]
fn test_extraction_over_custom_document() {
    let document = FixedDocument {
        nodes: vec![
            NodeHandle::new(0, "TITLE", vec![], "First"),
            NodeHandle::new(1, "link", vec![("href".into(), "/1".into())], ""),
            NodeHandle::new(2, "title", vec![], "Second"),
        ],
    };

    let records = extractor(&[("title", "title"), ("href", "link @href")]).extract(&document);

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].text("title"), Some("First"));
    assert_eq!(records[0].text("href"), Some("/1"));
    assert_eq!(records[1].text("title"), Some("Second"));
    assert!(!records[1].contains("href"));
}
