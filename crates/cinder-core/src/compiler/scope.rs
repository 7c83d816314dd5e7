//! Lexical Scope Tracking
//!
//! Mirrors the run-time stack layout at compile time: the n-th live local
//! occupies stack slot n.

/// Local slots addressable by a one-byte operand
pub const MAX_LOCALS: usize = u8::MAX as usize + 1;

#[derive(Debug, Clone, Copy)]
pub struct Local<'src> {
    pub name: &'src str,
    /// `None` until the initializer has been compiled
    pub depth: Option<usize>,
}

#[derive(Debug, Default)]
pub struct Scope<'src> {
    locals: Vec<Local<'src>>,
    depth: usize,
}

/// Outcome of resolving a name against the local list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Local(u8),
    /// Found, but its initializer is still being compiled
    Uninitialized,
    Global,
}

impl<'src> Scope<'src> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_global(&self) -> bool {
        self.depth == 0
    }

    pub fn begin(&mut self) {
        self.depth += 1;
    }

    /// Close the innermost scope; returns how many locals went out of scope
    pub fn end(&mut self) -> usize {
        self.depth = self.depth.saturating_sub(1);
        let depth = self.depth;
        let live = self
            .locals
            .iter()
            .rposition(|local| local.depth.map_or(true, |d| d <= depth))
            .map_or(0, |i| i + 1);
        let popped = self.locals.len() - live;
        self.locals.truncate(live);
        popped
    }

    pub fn is_full(&self) -> bool {
        self.locals.len() >= MAX_LOCALS
    }

    /// True if `name` is already declared in the innermost scope
    pub fn declared_in_current(&self, name: &str) -> bool {
        self.locals
            .iter()
            .rev()
            .take_while(|local| local.depth.map_or(true, |d| d >= self.depth))
            .any(|local| local.name == name)
    }

    pub fn add_local(&mut self, name: &'src str) {
        self.locals.push(Local { name, depth: None });
    }

    /// Mark the most recent local as usable
    pub fn mark_initialized(&mut self) {
        if let Some(local) = self.locals.last_mut() {
            local.depth = Some(self.depth);
        }
    }

    /// Innermost declaration wins, which gives shadowing
    pub fn resolve(&self, name: &str) -> Resolution {
        match self.locals.iter().rposition(|local| local.name == name) {
            Some(slot) => match self.locals[slot].depth {
                None => Resolution::Uninitialized,
                Some(_) => u8::try_from(slot).map_or(Resolution::Global, Resolution::Local),
            },
            None => Resolution::Global,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_declaration_shadows_outer() {
        let mut scope = Scope::new();
        scope.begin();
        scope.add_local("a");
        scope.mark_initialized();
        scope.begin();
        scope.add_local("a");
        scope.mark_initialized();

        assert_eq!(scope.resolve("a"), Resolution::Local(1));
        assert_eq!(scope.end(), 1);
        assert_eq!(scope.resolve("a"), Resolution::Local(0));
        assert_eq!(scope.end(), 1);
        assert_eq!(scope.resolve("a"), Resolution::Global);
    }

    #[test]
    fn uninitialized_local_is_reported() {
        let mut scope = Scope::new();
        scope.begin();
        scope.add_local("x");
        assert_eq!(scope.resolve("x"), Resolution::Uninitialized);
        scope.mark_initialized();
        assert_eq!(scope.resolve("x"), Resolution::Local(0));
    }

    #[test]
    fn duplicates_are_checked_only_in_innermost_scope() {
        let mut scope = Scope::new();
        scope.begin();
        scope.add_local("a");
        scope.mark_initialized();
        assert!(scope.declared_in_current("a"));

        scope.begin();
        assert!(!scope.declared_in_current("a"));
        scope.add_local("b");
        scope.mark_initialized();
        assert!(scope.declared_in_current("b"));
    }
}
