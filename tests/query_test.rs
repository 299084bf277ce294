mod common;

use std::sync::Arc;
use quarry::analysis::analyzer::TextAnalyzer;
use quarry::core::engine::Engine;
use quarry::core::error::ErrorKind;
use quarry::query::ast::{BooleanQuery, Operator, Query};
use common::{article, ids, sorted_ids};

fn library() -> Engine {
    let engine = Engine::in_memory();
    let mut writer = engine.writer().unwrap();
    writer.add_document(article(1, "rust search engine", "fast and safe")).unwrap();
    writer.add_document(article(2, "java search engine", "mature and verbose")).unwrap();
    writer.commit().unwrap();
    writer.add_document(article(3, "rust compiler", "safe systems")).unwrap();
    writer.add_document(article(4, "cooking recipes", "fast dinners")).unwrap();
    writer.commit().unwrap();
    engine
}

fn search(engine: &Engine, query: impl Into<Query>) -> Vec<i64> {
    sorted_ids(&engine.search(&query.into(), 100).unwrap())
}

fn parsed_with(fields: &[&str], text: &str, operator: Operator) -> Query {
    match Query::parsed(fields, text) {
        Query::ParsedText(query) => Query::ParsedText(query.with_operator(operator)),
        other => other,
    }
}

#[test]
fn test_boolean_algebra() {
    let engine = library();

    let difference = BooleanQuery::new()
        .with_must(Query::term("title", "search"))
        .with_must_not(Query::term("title", "java"));
    assert_eq!(search(&engine, difference), vec![1]);

    let union = BooleanQuery::new()
        .with_should(Query::term("title", "rust"))
        .with_should(Query::term("title", "java"));
    assert_eq!(search(&engine, union), vec![1, 2, 3]);

    let intersection = BooleanQuery::new()
        .with_must(Query::term("content", "fast"))
        .with_must(Query::term("content", "safe"));
    assert_eq!(search(&engine, intersection), vec![1]);

    // With required clauses present, one optional clause must still match
    let required_and_optional = BooleanQuery::new()
        .with_must(Query::term("title", "engine"))
        .with_should(Query::term("content", "safe"));
    assert_eq!(search(&engine, required_and_optional), vec![1]);

    let nested = BooleanQuery::new()
        .with_must(Query::from(
            BooleanQuery::new()
                .with_should(Query::term("content", "fast"))
                .with_should(Query::term("content", "safe")),
        ))
        .with_must_not(Query::term("title", "cooking"));
    assert_eq!(search(&engine, nested), vec![1, 3]);
}

#[test]
fn test_queries_without_positive_clauses_match_nothing() {
    let engine = library();
    assert!(search(&engine, BooleanQuery::new()).is_empty());
    assert!(search(&engine, BooleanQuery::new().with_must_not(Query::term("title", "java"))).is_empty());

    let impossible = BooleanQuery::new()
        .with_must(Query::term("title", "rust"))
        .with_must(Query::term("title", "nonexistent"));
    assert!(search(&engine, impossible).is_empty());
    assert!(search(&engine, Query::term("nofield", "rust")).is_empty());
}

#[test]
fn test_boost_changes_ranking() {
    let engine = library();
    let query = BooleanQuery::new()
        .with_should(Query::term("title", "java"))
        .with_should(Query::term("title", "rust").with_boost(10.0));
    let top = engine.search(&query.into(), 10).unwrap();
    assert_eq!(ids(&top), vec![1, 3, 2]);
    assert!(top.hits[1].score > top.hits[2].score);
}

#[test]
fn test_parsed_queries() {
    let engine = library();
    let fields = ["title", "content"];

    assert_eq!(search(&engine, Query::parsed(&fields, "rust -compiler")), vec![1]);
    assert_eq!(search(&engine, Query::parsed(&["title"], "search AND NOT java")), vec![1]);
    assert_eq!(search(&engine, Query::parsed(&fields, "title:(rust OR cooking)")), vec![1, 3, 4]);
    assert_eq!(search(&engine, Query::parsed(&fields, "+content:fast +title:rust")), vec![1]);
    assert_eq!(search(&engine, Query::parsed(&fields, "id:[2 TO 3]")), vec![2, 3]);
    assert_eq!(search(&engine, Query::parsed(&fields, "id:{2 TO *]")), vec![3, 4]);
    assert_eq!(search(&engine, Query::parsed(&fields, "*:*")), vec![1, 2, 3, 4]);
    assert_eq!(search(&engine, Query::parsed(&fields, "SAFE")), vec![1, 3]);
    assert_eq!(search(&engine, Query::parsed(&["title"], "java\u{3000}cooking")), vec![2, 4]);
    assert_eq!(search(&engine, Query::parsed(&["title"], "java\u{a0}cooking")), vec![2, 4]);
}

#[test]
fn test_parsed_default_operator() {
    let engine = library();
    assert_eq!(search(&engine, parsed_with(&["content"], "fast safe", Operator::Or)), vec![1, 3, 4]);
    assert_eq!(search(&engine, parsed_with(&["content"], "fast safe", Operator::And)), vec![1]);
    assert_eq!(search(&engine, parsed_with(&["content"], "fast OR safe", Operator::And)), vec![1, 3, 4]);
}

#[test]
fn test_parse_errors_report_position() {
    let engine = library();

    let err = engine.search(&Query::parsed(&["title"], "rust AND"), 10).unwrap_err();
    assert_eq!(err.kind, ErrorKind::QueryParse { position: 8 });

    let err = engine.search(&Query::parsed(&["title"], "(rust"), 10).unwrap_err();
    assert_eq!(err.parse_position(), Some(5));

    let err = engine.search(&Query::parsed(&["title"], "id:[1 TO x]"), 10).unwrap_err();
    assert_eq!(err.parse_position(), Some(9));
}

#[test]
fn test_stop_words_only_query_is_empty() {
    let engine = Engine::in_memory().with_analyzer(Arc::new(TextAnalyzer::english()));
    let mut writer = engine.writer().unwrap();
    writer.add_document(article(1, "the tutors", "and the jokes")).unwrap();
    writer.commit().unwrap();

    assert!(search(&engine, Query::parsed(&["title"], "the")).is_empty());
    assert_eq!(search(&engine, Query::parsed(&["title"], "the tutor")), vec![1]);
    assert_eq!(search(&engine, Query::multi_field(&["title", "content"], "joking")), vec![1]);
}

#[test]
fn test_count_matches_search_total() {
    let engine = library();
    let reader = engine.reader().unwrap();
    let searcher = engine.searcher(&reader);

    let query = Query::parsed(&["title", "content"], "rust OR fast");
    let top = searcher.search(&query, 1).unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top.total_hits, 3);
    assert_eq!(searcher.count(&query).unwrap(), 3);
}
