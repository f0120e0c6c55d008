use crate::events::{ContainerKind, WindowDescriptor};
use swayipc_async::{Node, NodeType};

pub fn container_kind(node_type: &NodeType) -> ContainerKind {
    match node_type {
        NodeType::Con => ContainerKind::Con,
        NodeType::FloatingCon => ContainerKind::FloatingCon,
        other => ContainerKind::Other(format!("{:?}", other).to_lowercase()),
    }
}

/// У окон XWayland нет app_id, вместо него используется X11 class
pub fn window_app_id<'a>(app_id: Option<&'a str>, x11_class: Option<&'a str>) -> &'a str {
    app_id.or(x11_class).unwrap_or("")
}

pub fn descriptor(node: &Node) -> WindowDescriptor {
    let class = node
        .window_properties
        .as_ref()
        .and_then(|props| props.class.as_deref());

    WindowDescriptor::new(node.id, container_kind(&node.node_type))
        .with_app_id(window_app_id(node.app_id.as_deref(), class))
        .with_focused(node.focused)
}

/// Обход в глубину: сам узел, затем `nodes`, затем `floating_nodes`
pub fn flatten(root: &Node) -> Vec<WindowDescriptor> {
    let mut out = Vec::new();
    collect_into(root, &mut out);
    out
}

fn collect_into(node: &Node, out: &mut Vec<WindowDescriptor>) {
    out.push(descriptor(node));
    for child in node.nodes.iter().chain(node.floating_nodes.iter()) {
        collect_into(child, out);
    }
}
