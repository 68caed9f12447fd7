#![cfg(test)]

pub mod directory {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use triage_db::{Owner, PatternRule};

    use crate::directory::OwnerDirectory;
    use crate::error::{Result, TriageError};

    /// In-memory owner directory that counts lookups.
    ///
    /// Build it up with the `with_*` methods; `failing()` makes every call
    /// return an infrastructure error.
    #[derive(Debug, Default)]
    pub struct MockDirectory {
        owners: Vec<Owner>,
        rules: Vec<PatternRule>,
        /// (team name, member) in insertion order
        team_members: Vec<(String, Owner)>,
        fail: bool,
        rule_lookups: AtomicUsize,
        owner_lookups: AtomicUsize,
        team_lookups: AtomicUsize,
    }

    impl MockDirectory {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_owner(mut self, owner: Owner) -> Self {
            self.owners.push(owner);
            self
        }

        pub fn with_rule(mut self, rule: PatternRule) -> Self {
            self.rules.push(rule);
            self
        }

        pub fn with_team_member(mut self, team: impl Into<String>, owner: Owner) -> Self {
            self.team_members.push((team.into(), owner));
            self
        }

        pub fn failing(mut self) -> Self {
            self.fail = true;
            self
        }

        pub fn rule_lookups(&self) -> usize {
            self.rule_lookups.load(Ordering::SeqCst)
        }

        pub fn owner_lookups(&self) -> usize {
            self.owner_lookups.load(Ordering::SeqCst)
        }

        pub fn team_lookups(&self) -> usize {
            self.team_lookups.load(Ordering::SeqCst)
        }

        fn check(&self) -> Result<()> {
            if self.fail {
                return Err(TriageError::directory_unavailable("mock directory offline"));
            }
            Ok(())
        }

        fn find_owner(&self, predicate: impl Fn(&Owner) -> bool) -> Result<Option<Owner>> {
            self.owner_lookups.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            Ok(self.owners.iter().find(|o| predicate(o)).cloned())
        }
    }

    #[async_trait]
    impl OwnerDirectory for MockDirectory {
        async fn active_pattern_rules(&self) -> Result<Vec<PatternRule>> {
            self.rule_lookups.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            Ok(self.rules.iter().filter(|r| r.active).cloned().collect())
        }

        async fn owner(&self, id: &str) -> Result<Option<Owner>> {
            self.find_owner(|o| o.id == id)
        }

        async fn owner_by_email(&self, email: &str) -> Result<Option<Owner>> {
            self.find_owner(|o| o.email == email)
        }

        async fn owner_by_external_id(&self, external_id: &str) -> Result<Option<Owner>> {
            self.find_owner(|o| o.external_id.as_deref() == Some(external_id))
        }

        async fn owner_by_name(&self, name: &str) -> Result<Option<Owner>> {
            self.find_owner(|o| o.name == name)
        }

        async fn first_active_team_owner(&self, team_name: &str) -> Result<Option<Owner>> {
            self.team_lookups.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            Ok(self
                .team_members
                .iter()
                .find(|(team, owner)| team == team_name && owner.active)
                .map(|(_, owner)| owner.clone()))
        }
    }
}

pub mod blame {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::strategy::{BlameAuthor, BlameProvider};

    /// Blame provider answering from a fixed table.
    #[derive(Debug)]
    pub struct MockBlameProvider {
        lines: HashMap<(String, u32), BlameAuthor>,
        available: bool,
        revision: Option<String>,
        blame_calls: AtomicUsize,
        revision_calls: AtomicUsize,
    }

    impl MockBlameProvider {
        pub fn new() -> Self {
            Self {
                lines: HashMap::new(),
                available: true,
                revision: None,
                blame_calls: AtomicUsize::new(0),
                revision_calls: AtomicUsize::new(0),
            }
        }

        pub fn with_line(
            mut self,
            path: impl Into<String>,
            line: u32,
            name: impl Into<String>,
            email: impl Into<String>,
        ) -> Self {
            self.lines.insert(
                (path.into(), line),
                BlameAuthor {
                    name: name.into(),
                    email: email.into(),
                },
            );
            self
        }

        /// Behave as if the VCS tool were missing.
        pub fn unavailable(mut self) -> Self {
            self.available = false;
            self
        }

        pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
            self.revision = Some(revision.into());
            self
        }

        pub fn blame_calls(&self) -> usize {
            self.blame_calls.load(Ordering::SeqCst)
        }

        pub fn revision_calls(&self) -> usize {
            self.revision_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BlameProvider for MockBlameProvider {
        async fn blame_line(&self, path: &str, line: u32) -> Option<BlameAuthor> {
            self.blame_calls.fetch_add(1, Ordering::SeqCst);
            if !self.available {
                return None;
            }
            self.lines.get(&(path.to_string(), line)).cloned()
        }

        async fn is_available(&self) -> bool {
            self.available
        }

        async fn revision(&self) -> Option<String> {
            self.revision_calls.fetch_add(1, Ordering::SeqCst);
            self.revision.clone()
        }
    }
}

pub mod strategy {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use triage_db::Owner;

    use crate::error::{Result, TriageError};
    use crate::frame::Frame;
    use crate::strategy::{OwnershipStrategy, StrategyKind};

    #[derive(Debug)]
    enum Behaviour {
        Empty,
        Returning(Owner),
        Failing,
    }

    /// Strategy with a fixed answer that counts its invocations.
    #[derive(Debug)]
    pub struct CountingStrategy {
        kind: StrategyKind,
        behaviour: Behaviour,
        calls: AtomicUsize,
    }

    impl CountingStrategy {
        fn with(kind: StrategyKind, behaviour: Behaviour) -> Self {
            Self {
                kind,
                behaviour,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn empty(kind: StrategyKind) -> Self {
            Self::with(kind, Behaviour::Empty)
        }

        pub fn returning(kind: StrategyKind, owner: Owner) -> Self {
            Self::with(kind, Behaviour::Returning(owner))
        }

        pub fn failing(kind: StrategyKind) -> Self {
            Self::with(kind, Behaviour::Failing)
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl OwnershipStrategy for CountingStrategy {
        fn kind(&self) -> StrategyKind {
            self.kind
        }

        async fn resolve(&self, _frames: &[Frame]) -> Result<Option<Owner>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behaviour {
                Behaviour::Empty => Ok(None),
                Behaviour::Returning(owner) => Ok(Some(owner.clone())),
                Behaviour::Failing => Err(TriageError::directory_unavailable("strategy failed")),
            }
        }
    }
}
