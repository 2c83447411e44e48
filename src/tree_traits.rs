use termtree::Tree;
use tracing::instrument;

use crate::document::Document;
use crate::domain::{FormatValue, LeafContent, NodeId};
use crate::errors::TreeResult;
use crate::infrastructure::traits::Presentation;

pub trait TreeDisplay {
    fn to_tree_string(&self, id: NodeId) -> TreeResult<Tree<String>>;
}

impl<P: Presentation> TreeDisplay for Document<P> {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self, id: NodeId) -> TreeResult<Tree<String>> {
        let node = self.node(id)?;
        let mut label = format!("{}({})", node.kind, self.length(id)?);
        match (node.leaf(), &node.value) {
            (Some(LeafContent::Text(text)), _) => label.push_str(&format!(" {:?}", text)),
            (_, FormatValue::Text(value)) => label.push_str(&format!(" = {}", value)),
            _ => {}
        }

        // Recursively construct the children
        let leaves = if node.is_container() {
            self.children(id)?
                .into_iter()
                .map(|child| self.to_tree_string(child))
                .collect::<TreeResult<Vec<_>>>()?
        } else {
            Vec::new()
        };

        Ok(Tree::new(label).with_leaves(leaves))
    }
}
