use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use super::model::MemberSummary;
use super::{Id, Repository};

#[async_trait]
pub trait UserService {
    /// Resolves ids in the given order; unknown ids become placeholders.
    async fn find_summaries(&self, ids: &[Id]) -> super::Result<Vec<MemberSummary>>;

    /// Returns the ids the directory does not know, in the given order.
    async fn find_unknown(&self, ids: &[Id]) -> super::Result<Vec<Id>>;
}

#[derive(Clone)]
pub struct UserServiceImpl {
    repo: Repository,
}

impl UserServiceImpl {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl UserService for UserServiceImpl {
    async fn find_summaries(&self, ids: &[Id]) -> super::Result<Vec<MemberSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut found = self
            .repo
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(|u| (*u.id(), MemberSummary::from(u)))
            .collect::<HashMap<_, _>>();

        let summaries = ids
            .iter()
            .map(|id| {
                found
                    .remove(id)
                    .unwrap_or_else(|| MemberSummary::unresolved(*id))
            })
            .collect();

        Ok(summaries)
    }

    async fn find_unknown(&self, ids: &[Id]) -> super::Result<Vec<Id>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let known = self
            .repo
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(|u| *u.id())
            .collect::<HashSet<_>>();

        Ok(ids.iter().filter(|id| !known.contains(id)).copied().collect())
    }
}
