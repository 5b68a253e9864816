//! The dynamic scope: the chain of base URIs lexically entered during one
//! evaluation, used to resolve `$dynamicRef` and `$recursiveRef`.

use json_schema_uri::Uri;

/// An append-only stack of base URIs. A frame is pushed when evaluation
/// enters a subschema whose resolved base URI differs from the top of the
/// stack, and popped on return. The stack never drops below one frame (the
/// evaluation root).
#[derive(Debug, Clone)]
pub struct DynamicScope {
    frames: Vec<Uri>,
}

impl DynamicScope {
    pub fn new(root: Uri) -> Self {
        DynamicScope { frames: vec![root] }
    }

    /// Push a frame if `base` differs from the current top. Returns whether
    /// a frame was pushed (so the caller can pop symmetrically).
    pub fn push(&mut self, base: &Uri) -> bool {
        if self.top() == base {
            return false;
        }
        self.frames.push(base.clone());
        true
    }

    /// Pop the top frame. The root frame is never removed.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn top(&self) -> &Uri {
        // Invariant: at least one frame.
        &self.frames[self.frames.len() - 1]
    }

    /// Frames from outermost to innermost.
    pub fn frames(&self) -> &[Uri] {
        &self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_dedupes_top() {
        let a = Uri::parse("https://example.com/a");
        let b = Uri::parse("https://example.com/b");
        let mut scope = DynamicScope::new(a.clone());
        assert!(!scope.push(&a));
        assert!(scope.push(&b));
        assert_eq!(scope.frames().len(), 2);
        assert_eq!(scope.top(), &b);
        scope.pop();
        assert_eq!(scope.top(), &a);
    }

    #[test]
    fn test_root_frame_survives_pop() {
        let a = Uri::parse("https://example.com/a");
        let mut scope = DynamicScope::new(a.clone());
        scope.pop();
        scope.pop();
        assert_eq!(scope.top(), &a);
        assert_eq!(scope.frames().len(), 1);
    }
}
