//! Pre-order document traversal feeding the carousel assembler.

use crate::ast::DocumentNode;
use crate::carousel::{CarouselAssembler, FlexOutput};
use crate::component::ComponentFactory;
use tracing::debug;

/// Walks a document with an explicit stack, so nesting depth never grows the
/// call stack.
pub struct TreeWalker<'a> {
    factory: ComponentFactory<'a>,
    assembler: CarouselAssembler,
}

impl<'a> TreeWalker<'a> {
    pub fn new(factory: ComponentFactory<'a>, assembler: CarouselAssembler) -> Self {
        Self { factory, assembler }
    }

    pub fn visit(mut self, root: &DocumentNode) -> FlexOutput {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if node.kind.is_parent_owned() {
                stack.extend(node.children.iter().rev());
                continue;
            }
            let Some(component) = self.factory.create(node) else {
                stack.extend(node.children.iter().rev());
                continue;
            };
            let detached = self.factory.detached(node);
            debug!(
                kind = component.kind().unwrap_or("unknown"),
                detached = detached.len(),
                "component emitted"
            );
            self.assembler.add_component(component);
            let fragment = plain_text(node, &detached);
            if !fragment.is_empty() {
                self.assembler.add_plain_text(fragment);
            }
            stack.extend(detached.into_iter().rev());
        }
        self.assembler.build()
    }
}

/// Space-joined literals of `node`'s subtree, leaving out `excluded` subtrees.
pub fn plain_text(node: &DocumentNode, excluded: &[&DocumentNode]) -> String {
    let mut parts = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if excluded.iter().any(|skip| std::ptr::eq(*skip, current)) {
            continue;
        }
        if let Some(literal) = current.literal() {
            parts.push(literal);
        }
        stack.extend(current.children.iter().rev());
    }
    parts.join(" ").trim().to_string()
}
