use std::{
    collections::BTreeSet,
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::debug;

/// Default node cap for `/graph-data` when no `limit` is given.
pub const DEFAULT_LIMIT: usize = 60;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Relation {
    pub source: String,
    pub target: String,
    pub relation: String,
    pub weight: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub label: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub label: String,
    pub weight: i64,
    pub relation: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    pub msg: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: 200,
            msg: "success".to_string(),
            data,
        }
    }

    pub fn fail(code: i64, msg: impl Into<String>, data: T) -> Self {
        Self {
            code,
            msg: msg.into(),
            data,
        }
    }
}

#[derive(Deserialize)]
pub struct QuestionRequest {
    pub question: String,
    #[serde(default = "default_mode")]
    pub mode: String,
}

fn default_mode() -> String {
    "quick".to_string()
}

#[derive(Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// Directed, weighted entity graph. Node order is first-seen order.
#[derive(Debug, Default)]
pub struct KnowledgeGraph {
    nodes: Vec<String>,
    relations: Vec<Relation>,
}

impl KnowledgeGraph {
    pub fn from_relations(relations: Vec<Relation>) -> Self {
        let mut nodes = Vec::new();
        for r in &relations {
            for name in [&r.source, &r.target] {
                if !nodes.contains(name) {
                    nodes.push(name.clone());
                }
            }
        }
        Self { nodes, relations }
    }

    /// A small front-end technology graph.
    pub fn sample() -> Self {
        let rel = |source: &str, target: &str, relation: &str, weight: i64| Relation {
            source: source.to_string(),
            target: target.to_string(),
            relation: relation.to_string(),
            weight,
        };
        Self::from_relations(vec![
            rel("HTML", "CSS", "styled by", 9),
            rel("HTML", "JavaScript", "scripted by", 8),
            rel("JavaScript", "TypeScript", "superset", 9),
            rel("JavaScript", "React", "library", 8),
            rel("JavaScript", "Vue", "library", 7),
            rel("React", "Redux", "state management", 6),
            rel("React", "Next.js", "framework", 7),
            rel("Vue", "Vuex", "state management", 5),
            rel("CSS", "Sass", "preprocessor", 5),
            rel("C/C++", "WebAssembly", "compiles to", 4),
            rel("WebAssembly", "JavaScript", "interops with", 3),
        ])
    }

    pub fn entities(&self) -> &[String] {
        &self.nodes
    }

    pub fn contains(&self, entity: &str) -> bool {
        self.nodes.iter().any(|n| n == entity)
    }

    /// Relations where `entity` is either endpoint.
    pub fn relations_of<'a>(&'a self, entity: &'a str) -> impl Iterator<Item = &'a Relation> + 'a {
        self.relations
            .iter()
            .filter(move |r| r.source == entity || r.target == entity)
    }

    fn degree(&self, entity: &str) -> usize {
        self.relations_of(entity).count()
    }

    /// Nodes from `names` (in graph order) and every edge between two of them.
    fn subgraph(&self, names: &BTreeSet<String>) -> Graph {
        let nodes = self
            .nodes
            .iter()
            .filter(|n| names.contains(*n))
            .map(|n| node(n))
            .collect();
        let edges = self
            .relations
            .iter()
            .filter(|r| names.contains(&r.source) && names.contains(&r.target))
            .map(edge)
            .collect();
        Graph { nodes, edges }
    }

    pub fn full(&self) -> Graph {
        Graph {
            nodes: self.nodes.iter().map(|n| node(n)).collect(),
            edges: self.relations.iter().map(edge).collect(),
        }
    }

    /// The `limit` highest-degree nodes and the edges among them.
    pub fn top(&self, limit: usize) -> Graph {
        let mut ranked: Vec<&String> = self.nodes.iter().collect();
        ranked.sort_by_key(|n| std::cmp::Reverse(self.degree(n)));
        let names = ranked.into_iter().take(limit).cloned().collect();
        self.subgraph(&names)
    }

    /// `entity`, its neighbours, and the edges among them.
    pub fn around(&self, entity: &str) -> Graph {
        if !self.contains(entity) {
            return Graph {
                nodes: vec![node(entity)],
                edges: Vec::new(),
            };
        }
        let mut names = BTreeSet::from([entity.to_string()]);
        for r in self.relations_of(entity) {
            names.insert(r.source.clone());
            names.insert(r.target.clone());
        }
        self.subgraph(&names)
    }

    /// Case-insensitive substring match plus every edge touching a match.
    pub fn fuzzy(&self, keyword: &str) -> Graph {
        let needle = keyword.to_lowercase();
        let matched: BTreeSet<&String> = self
            .nodes
            .iter()
            .filter(|n| n.to_lowercase().contains(&needle))
            .collect();
        let mut names: BTreeSet<String> = matched.iter().map(|n| n.to_string()).collect();
        let mut edges = Vec::new();
        for r in &self.relations {
            if matched.contains(&r.source) || matched.contains(&r.target) {
                names.insert(r.source.clone());
                names.insert(r.target.clone());
                edges.push(edge(r));
            }
        }
        let nodes = self
            .nodes
            .iter()
            .filter(|n| names.contains(*n))
            .map(|n| node(n))
            .collect();
        Graph { nodes, edges }
    }

    /// Up to five neighbours, heaviest relation first.
    pub fn recommendations(&self, entity: &str) -> Vec<Value> {
        let mut related: Vec<&Relation> = self.relations_of(entity).collect();
        related.sort_by_key(|r| std::cmp::Reverse(r.weight));
        related
            .into_iter()
            .take(5)
            .map(|r| {
                let other = if r.source == entity { &r.target } else { &r.source };
                json!({
                    "entity": other,
                    "reason": format!("{} {} {}", r.source, r.relation, r.target),
                    "weight": r.weight,
                })
            })
            .collect()
    }

    pub fn learning_path(&self, entity: &str) -> Option<Value> {
        if !self.contains(entity) {
            return None;
        }
        let prerequisites: Vec<&String> = self
            .relations
            .iter()
            .filter(|r| r.target == entity)
            .map(|r| &r.source)
            .collect();
        let next: Vec<&String> = self
            .relations
            .iter()
            .filter(|r| r.source == entity)
            .map(|r| &r.target)
            .collect();
        Some(json!({
            "entity": entity,
            "prerequisites": prerequisites,
            "next": next,
        }))
    }

    pub fn answer(&self, question: &str, mode: &str) -> Value {
        let entities: Vec<&String> = self
            .nodes
            .iter()
            .filter(|n| question.contains(n.as_str()))
            .collect();
        let (answer, recommendations) = match entities.first() {
            Some(main) => {
                let facts: Vec<String> = self
                    .relations_of(main)
                    .map(|r| format!("<li>{} {} {}</li>", r.source, r.relation, r.target))
                    .collect();
                (
                    format!("<p>{main} ({mode})</p><ul>{}</ul>", facts.join("")),
                    self.recommendations(main),
                )
            }
            None => ("<p>No matching entity found.</p>".to_string(), Vec::new()),
        };
        json!({
            "answer": answer,
            "related_entities": entities,
            "recommendations": recommendations,
        })
    }
}

fn node(name: &str) -> Node {
    Node {
        id: name.to_string(),
        label: name.to_string(),
    }
}

fn edge(r: &Relation) -> Edge {
    Edge {
        from: r.source.clone(),
        to: r.target.clone(),
        label: r.relation.clone(),
        weight: r.weight,
        relation: r.relation.clone(),
    }
}

pub type SharedGraph = Arc<KnowledgeGraph>;

pub fn app() -> Router {
    app_with(KnowledgeGraph::sample())
}

pub fn app_with(graph: KnowledgeGraph) -> Router {
    let graph: SharedGraph = Arc::new(graph);
    let api = Router::new()
        .route("/graph-data", get(graph_data))
        .route("/graph-data/full", get(full_graph_data))
        .route("/graph-data/entity/{entity}", get(graph_data_by_entity))
        .route("/graph-data/entity/fuzzy/{keyword}", get(fuzzy_search))
        .route("/qa", post(qa))
        .route("/entities", get(entities))
        .route("/recommendations/{entity}", get(recommendations))
        .route("/learning-path/{entity}", get(learning_path))
        .with_state(graph);
    Router::new().nest("/api", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn graph_data(State(graph): State<SharedGraph>, Query(query): Query<LimitQuery>) -> Json<Envelope<Graph>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    debug!(limit, "graph data");
    Json(Envelope::ok(graph.top(limit)))
}

async fn full_graph_data(State(graph): State<SharedGraph>) -> Json<Envelope<Graph>> {
    Json(Envelope::ok(graph.full()))
}

async fn graph_data_by_entity(
    State(graph): State<SharedGraph>,
    Path(entity): Path<String>,
) -> Json<Envelope<Graph>> {
    debug!(%entity, "graph data by entity");
    if entity.trim().is_empty() || entity.starts_with("[object") {
        return Json(Envelope::fail(400, "invalid entity name", Graph::default()));
    }
    Json(Envelope::ok(graph.around(&entity)))
}

async fn fuzzy_search(
    State(graph): State<SharedGraph>,
    Path(keyword): Path<String>,
) -> Json<Envelope<Graph>> {
    debug!(%keyword, "fuzzy search");
    if keyword.trim().is_empty() {
        return Json(Envelope::fail(400, "keyword must not be empty", Graph::default()));
    }
    Json(Envelope::ok(graph.fuzzy(&keyword)))
}

async fn qa(State(graph): State<SharedGraph>, Json(input): Json<QuestionRequest>) -> Json<Envelope<Value>> {
    debug!(question = %input.question, mode = %input.mode, "qa");
    if input.question.trim().is_empty() {
        return Json(Envelope::fail(400, "question must not be empty", Value::Null));
    }
    Json(Envelope::ok(graph.answer(&input.question, &input.mode)))
}

async fn entities(State(graph): State<SharedGraph>) -> Json<Envelope<Vec<String>>> {
    Json(Envelope::ok(graph.entities().to_vec()))
}

async fn recommendations(
    State(graph): State<SharedGraph>,
    Path(entity): Path<String>,
) -> Json<Envelope<Vec<Value>>> {
    Json(Envelope::ok(graph.recommendations(&entity)))
}

async fn learning_path(State(graph): State<SharedGraph>, Path(entity): Path<String>) -> Json<Envelope<Value>> {
    match graph.learning_path(&entity) {
        Some(path) => Json(Envelope::ok(path)),
        None => Json(Envelope::fail(500, format!("unknown entity: {entity}"), Value::Null)),
    }
}
