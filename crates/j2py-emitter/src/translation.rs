//! A finished tree, ready to render.

use tracing::debug;

use crate::error::BuildError;
use crate::handlers::HandlerPipeline;
use crate::rewriter::OutputRewriter;
use crate::settings::EmitSettings;
use crate::template::{NodeId, TemplateTree};

#[derive(Debug)]
pub struct Translation {
    tree: TemplateTree,
    root: NodeId,
    settings: EmitSettings,
    pipeline: HandlerPipeline,
    rewriter: OutputRewriter,
}

impl Translation {
    pub(crate) fn new(
        tree: TemplateTree,
        root: NodeId,
        settings: EmitSettings,
        pipeline: HandlerPipeline,
        rewriter: OutputRewriter,
    ) -> Self {
        Translation {
            tree,
            root,
            settings,
            pipeline,
            rewriter,
        }
    }

    pub fn tree(&self) -> &TemplateTree {
        &self.tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn settings(&self) -> &EmitSettings {
        &self.settings
    }

    /// Emit the module, run its output handlers, then the output
    /// substitutions.
    pub fn render(&self) -> Result<String, BuildError> {
        let text = self.pipeline.render(&self.tree, self.root, &self.settings)?;
        let text = self.rewriter.apply(&text);
        debug!(bytes = text.len(), "rendered module");
        Ok(text)
    }

    /// Emit one subtree through its kind's output handlers, without the
    /// module-level substitutions.
    pub fn render_node(&self, id: NodeId) -> Result<String, BuildError> {
        self.pipeline.render(&self.tree, id, &self.settings)
    }

    /// Debug listing of the whole tree.
    pub fn dump_tree(&self) -> String {
        self.tree.dump_repr(self.root)
    }
}
