//! JSON line service integration tests.

use serde_json::Value;
use tokio::io::BufReader;
use waygrid_core::{Grid, Pathfinder};
use waygrid_server::{serve, PathCoordinator, ServeSummary, TerrainMap};

const STRIP: &str = "\
........
...#....
........
";

fn coordinator() -> PathCoordinator {
    let map = TerrainMap::parse(STRIP, 1.0).unwrap();
    let grid = Grid::build(&map.grid_config(0.5).with_blur_radius(0), &map).unwrap();
    PathCoordinator::spawn(Pathfinder::new(grid))
}

fn parse_lines(output: &[u8]) -> Vec<Value> {
    std::str::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn test_serve_answers_each_valid_line_in_order() {
    let coordinator = coordinator();
    let input = concat!(
        r#"{"id": "east", "start": {"x": 0.5, "y": 0.5}, "goal": {"x": 7.5, "y": 0.5}}"#,
        "\n",
        "not json at all\n",
        "\n",
        r#"{"start": {"x": 0.5, "y": 2.5}, "goal": {"x": 3.5, "y": 1.5}}"#,
        "\n",
    );
    let mut output = Vec::new();

    let summary = serve(&coordinator, BufReader::new(input.as_bytes()), &mut output)
        .await
        .unwrap();
    assert_eq!(
        summary,
        ServeSummary {
            accepted: 2,
            skipped: 1,
            written: 2
        }
    );

    let responses = parse_lines(&output);
    assert_eq!(responses.len(), 2);

    let east = &responses[0];
    assert_eq!(east["id"], "east");
    assert_eq!(east["success"], true);
    assert_eq!(east["waypoints"], serde_json::json!([{"x": 7.5, "y": 0.5}]));
    assert_eq!(east["path_cost"], 70);
    assert!(east["request_id"].as_str().is_some());
    assert!(east.get("failure").is_none());

    let walled = &responses[1];
    assert!(walled.get("id").is_none());
    assert_eq!(walled["success"], false);
    assert_eq!(walled["failure"], "goal_unwalkable");
    assert_eq!(walled["nodes_visited"], 0);
    assert_eq!(walled["waypoints"], serde_json::json!([]));

    assert_ne!(east["request_id"], walled["request_id"]);
    coordinator.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_serve_empty_input() {
    let coordinator = coordinator();
    let mut output = Vec::new();
    let summary = serve(&coordinator, BufReader::new(&b""[..]), &mut output)
        .await
        .unwrap();
    assert_eq!(summary, ServeSummary::default());
    assert!(output.is_empty());
    coordinator.shutdown().await.unwrap();
}
