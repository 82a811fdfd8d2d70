use std::collections::HashSet;

use segview_common::PacketInfo;
use serde::Serialize;

const ACTIVE_COLOR: &str = "#35D068";

/// Graph document consumed by the viewer frontend.
#[derive(Clone, Debug, Serialize)]
pub struct GraphData {
    pub nodes: Vec<NodeDatum>,
    pub links: Vec<LinkDatum>,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct NodeDatum {
    pub id: String,
    pub label: String,
    pub shape: String,
    pub color: String,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct LinkDatum {
    pub id: String,
    pub label: String,
    pub source: String,
    pub target: String,
    pub active: bool,
    pub color: String,
}

/// Builds the host graph from validated records: every packet source becomes
/// a scanner node, every listener a listener node, and each observed
/// (source, listener, target port) triple one directed link. Nodes and links
/// are deduplicated by id, first-seen order preserved.
pub fn build_graph(records: &[PacketInfo]) -> GraphData {
    let mut nodes: Vec<NodeDatum> = Vec::new();
    let mut links: Vec<LinkDatum> = Vec::new();
    let mut seen_nodes: HashSet<String> = HashSet::new();
    let mut seen_links: HashSet<String> = HashSet::new();

    for pkt in records {
        let source_id = format!("{}:scanner", pkt.source_ip);
        if seen_nodes.insert(source_id.clone()) {
            nodes.push(NodeDatum {
                id: source_id.clone(),
                label: format!("{}:{}:scanner", pkt.network_tag, pkt.source_ip),
                shape: "hexagon".to_string(),
                color: ACTIVE_COLOR.to_string(),
            });
        }

        let listener_id = format!("{}:listener", pkt.listener_ip);
        if seen_nodes.insert(listener_id.clone()) {
            nodes.push(NodeDatum {
                id: listener_id.clone(),
                label: format!("{}:{}:listener", pkt.network_tag, pkt.listener_ip),
                shape: "square".to_string(),
                color: ACTIVE_COLOR.to_string(),
            });
        }

        let link_id = format!("{}:{}:{}", pkt.source_ip, pkt.listener_ip, pkt.target_port);
        if seen_links.insert(link_id.clone()) {
            links.push(LinkDatum {
                id: link_id,
                label: format!("{} -> {}", pkt.source_port, pkt.target_port),
                source: source_id,
                target: listener_id,
                active: true,
                color: ACTIVE_COLOR.to_string(),
            });
        }
    }

    GraphData { nodes, links }
}
