use kgraph_core::{Entity, KnowledgeGraph, Relationship};
use kgraph_cypher::{Parameters, QueryError, Value, execute_query};

fn company_graph() -> KnowledgeGraph {
    KnowledgeGraph::builder()
        .entity(Entity::new("p1", "Alice", "Person").with_property("city", "Berlin"))
        .entity(Entity::new("p2", "Bob", "Person").with_property("city", "Paris"))
        .entity(Entity::new("p3", "Carol", "Person").with_property("city", "Berlin"))
        .entity(Entity::new("c1", "Acme", "Company"))
        .relationship(Relationship::new("r1", "p1", "c1", "WORKS_AT"))
        .relationship(Relationship::new("r2", "p3", "c1", "WORKS_AT"))
        .relationship(Relationship::new("r3", "p1", "p2", "KNOWS"))
        .build()
}

#[test]
fn test_id_function_in_return() {
    let graph = company_graph();
    let result = execute_query(
        &graph,
        "MATCH (p:Person) WHERE p.name = 'Alice' RETURN id(p) AS person_id",
        None,
    )
    .unwrap();
    assert_eq!(result.row_count(), 1);
    let row = result.rows().first().unwrap();
    assert_eq!(row.get("person_id"), Some(&Value::String("p1".to_string())));
}

#[test]
fn test_relationship_type_and_endpoints() {
    let graph = company_graph();
    let result = execute_query(
        &graph,
        "MATCH (p)-[r]->(c:Company) RETURN p.name AS who, type(r) AS rel ORDER BY who",
        None,
    )
    .unwrap();
    let rows: Vec<(String, String)> = result
        .rows()
        .iter()
        .map(|r| {
            (
                r.get("who").unwrap().to_simple_string(),
                r.get("rel").unwrap().to_simple_string(),
            )
        })
        .collect();
    assert_eq!(
        rows,
        vec![
            ("Alice".to_string(), "WORKS_AT".to_string()),
            ("Carol".to_string(), "WORKS_AT".to_string()),
        ]
    );
}

#[test]
fn test_parameters_and_string_predicates() {
    let graph = company_graph();
    let mut params = Parameters::new();
    params.insert("city".into(), Value::from("Berlin"));
    let result = execute_query(
        &graph,
        "MATCH (p:Person) WHERE p.city = $city AND p.name ENDS WITH 'ol' RETURN p.name",
        Some(&params),
    )
    .unwrap();
    assert_eq!(result.row_count(), 1);
    assert_eq!(result.rows()[0].get("p.name"), Some(&Value::from("Carol")));
}

#[test]
fn test_distinct_cities() {
    let graph = company_graph();
    let result = execute_query(
        &graph,
        "MATCH (p:Person) RETURN DISTINCT p.city AS city ORDER BY city",
        None,
    )
    .unwrap();
    let cities: Vec<_> = result
        .rows()
        .iter()
        .map(|r| r.get("city").unwrap().clone())
        .collect();
    assert_eq!(cities, vec![Value::from("Berlin"), Value::from("Paris")]);
}

#[test]
fn test_errors_surface() {
    let graph = company_graph();
    assert!(matches!(
        execute_query(&graph, "MATCH (p RETURN p", None),
        Err(QueryError::ParseError(_))
    ));
    assert!(matches!(
        execute_query(&graph, "MATCH (p) WHERE p.name = $missing RETURN p", None),
        Err(QueryError::ParameterNotFound(_))
    ));
    assert!(matches!(
        execute_query(&graph, "MATCH (p) RETURN shout(p.name)", None),
        Err(QueryError::UnknownFunction(_))
    ));
}

#[test]
fn test_dyn_backend() {
    let graph = company_graph();
    let backend: &dyn kgraph_core::GraphBackend = &graph;
    let result = execute_query(backend, "MATCH (c:Company) RETURN c.name", None).unwrap();
    assert_eq!(result.rows()[0].get("c.name"), Some(&Value::from("Acme")));
}
