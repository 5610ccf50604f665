use crate::error::ViewError;
use crate::platform::{Host, NodeId};

pub struct TextInstance {
    host: Host,
    text: String,
    node: Option<NodeId>,
}

impl TextInstance {
    pub(crate) fn new(host: &Host, text: String) -> Self {
        Self {
            host: host.clone(),
            text,
            node: None,
        }
    }

    pub(crate) fn host(&self) -> &Host {
        &self.host
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn mount(&mut self) -> Result<(), ViewError> {
        self.node = Some(self.host.create_text(&self.text));
        Ok(())
    }

    pub(crate) fn set_text(&mut self, text: String) -> Result<(), ViewError> {
        if text == self.text {
            return Ok(());
        }
        if let Some(node) = self.node {
            self.host.set_text(node, &text)?;
        }
        self.text = text;
        Ok(())
    }

    pub(crate) fn unmount(&mut self) -> Result<(), ViewError> {
        if let Some(node) = self.node {
            self.host.remove(node)?;
        }
        Ok(())
    }
}

/// Placeholder comment for a position that renders nothing.
pub struct HiddenInstance {
    host: Host,
    node: Option<NodeId>,
}

impl HiddenInstance {
    pub(crate) fn new(host: &Host) -> Self {
        Self {
            host: host.clone(),
            node: None,
        }
    }

    pub(crate) fn host(&self) -> &Host {
        &self.host
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub(crate) fn mount(&mut self) -> Result<(), ViewError> {
        self.node = Some(self.host.create_comment("hidden"));
        Ok(())
    }

    pub(crate) fn unmount(&mut self) -> Result<(), ViewError> {
        if let Some(node) = self.node {
            self.host.remove(node)?;
        }
        Ok(())
    }
}
