use serde::Deserialize;

use crate::github::RepoRef;
use crate::webhooks::github::events::{Comment, GitHubUser, Issue, Repository};

#[derive(Debug, Clone, Deserialize)]
pub struct IssueCommentEvent {
    pub repository: Repository,
    pub issue: Issue,
    pub action: IssueCommentAction,
    pub comment: Comment,
    /// Who triggered the delivery, the comment author for `created`.
    pub sender: GitHubUser,
}

impl IssueCommentEvent {
    /// Where replies to this comment should go. The owner login works for users and
    /// organizations alike.
    pub fn repo(&self) -> RepoRef<'_> {
        RepoRef {
            owner: &self.repository.owner.login,
            name: &self.repository.name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCommentAction {
    Created,
    Edited,
    Deleted,
    #[serde(other)]
    Other,
}
