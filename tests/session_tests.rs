//! Generation session integration tests

use std::sync::Arc;

use whiteboard_graph::{
    FragmentGenerator, GenerationOutcome, GraphStore, ReplayGenerator, WhiteboardConfig,
    WhiteboardSession, WorkspaceMode,
};

const ARCHITECTURE: &str = r#"Sure! ```json
{
  "graph": {
    "nodes": [
      { "id": "app", "label": "App", "type": "role" },
      { "id": "api", "label": "API", "type": "tech" },
      { "id": "db", "data": { "label": "Database" }, "type": "tech" }
    ],
    "edges": [
      { "source": "app", "target": "api" },
      { "source": "api", "target": "db", "label": "reads" },
      { "source": "api", "target": "cache" }
    ]
  },
  "reply": "Drew a three tier architecture."
}
```"#;

const RISKS: &str = r#"{ "nodes": [{ "id": "outage", "label": "Outage", "kind": "risk" }], "edges": [{ "id": "r1", "source": "db", "target": "outage" }] }"#;

fn session(config: WhiteboardConfig, responses: &[&str]) -> WhiteboardSession {
    let store = GraphStore::with_seed(config, 99).into_shared();
    let generator: Arc<dyn FragmentGenerator> = Arc::new(ReplayGenerator::new(responses.iter().copied()));
    WhiteboardSession::new(store, generator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sequential_prompts_build_one_board() {
        let session = session(WhiteboardConfig::default(), &[ARCHITECTURE, RISKS]);

        let first = session.submit_prompt("Sketch the architecture").await;
        let second = session.submit_prompt("What could go wrong?").await;

        match first {
            GenerationOutcome::Applied { merged, reply } => {
                assert_eq!(merged.added_nodes.len(), 3);
                assert_eq!(merged.added_edges.len(), 2);
                assert_eq!(merged.dropped_edges.len(), 1);
                assert_eq!(reply, "Drew a three tier architecture.");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(second.is_applied());

        let store = session.store().lock();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.nodes.len(), 4);
        assert_eq!(snapshot.edges.len(), 3);
        assert_eq!(snapshot.node(&"db".into()).map(|n| n.label.as_str()), Some("Database"));
        let outage = snapshot.node(&"outage".into()).unwrap();
        let db = snapshot.node(&"db".into()).unwrap();
        assert!(outage.position.x > db.position.x);
    }

    #[tokio::test]
    async fn test_concurrent_sessions_merge_without_duplicates() {
        let session = Arc::new(session(WhiteboardConfig::default(), &[ARCHITECTURE, ARCHITECTURE]));

        let (left, right) = tokio::join!(
            session.submit_prompt("Sketch the architecture"),
            session.submit_prompt("Sketch it again"),
        );

        assert!(left.is_applied() && right.is_applied());
        let store = session.store().lock();
        assert_eq!(store.graph().node_count(), 3);
        assert_eq!(store.graph().edge_count(), 2);
    }

    #[tokio::test]
    async fn test_brainstorm_prompt_places_sticky_notes() {
        let config = WhiteboardConfig::default().with_workspace(WorkspaceMode::Brainstorm);
        let session = session(config, &[ARCHITECTURE]);

        session.submit_prompt("Ideas please").await;

        let store = session.store().lock();
        let positions: Vec<_> = store.graph().nodes().map(|n| n.position).collect();
        assert_eq!(positions.len(), 3);
        for (i, first) in positions.iter().enumerate() {
            for second in &positions[i + 1..] {
                assert_ne!(first, second);
            }
        }
    }

    #[tokio::test]
    async fn test_clarifying_question_is_shown_without_touching_board() {
        let session = session(
            WhiteboardConfig::default(),
            &[ARCHITECTURE, r#"{ "reply": "Which platform should this run on?" }"#],
        );
        session.submit_prompt("Sketch the architecture").await;
        let before = session.store().lock().graph().clone();

        let outcome = session.submit_prompt("Add deployment").await;

        match outcome {
            GenerationOutcome::Applied { merged, reply } => {
                assert!(merged.added_nodes.is_empty() && merged.added_edges.is_empty());
                assert_eq!(reply, "Which platform should this run on?");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        let store = session.store().lock();
        assert_eq!(store.graph(), &before);
        assert_eq!(
            store.transcript().last().map(|m| m.content.as_str()),
            Some("Which platform should this run on?")
        );
    }

    #[test]
    fn test_exhausted_generator_is_reported_in_chat() {
        let session = session(WhiteboardConfig::default(), &[]);

        let outcome = tokio_test::block_on(session.submit_prompt("Hello?"));

        assert!(matches!(outcome, GenerationOutcome::Failed { .. }));
        let store = session.store().lock();
        assert!(store.graph().is_empty());
        assert_eq!(store.transcript().len(), 3);
    }
}
