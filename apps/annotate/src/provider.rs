use std::cell::{Cell, RefCell};

use smartcomment_traits::comments::{
    CommentId, CommentProvider, CommentRecord, CommentStatus, CreatedComment, NewComment,
    ProviderError,
};

/// Serves comments from a JSON array of comment records. Writes only live in memory.
pub struct JsonCommentProvider {
    comments: RefCell<Vec<CommentRecord>>,
    next_id: Cell<u64>,
}

impl JsonCommentProvider {
    pub fn from_json(json: &str) -> Result<Self, ProviderError> {
        let comments: Vec<CommentRecord> = serde_json::from_str(json)?;
        let next_id = comments
            .iter()
            .filter_map(|comment| comment.id.as_str().parse::<u64>().ok())
            .max()
            .map_or(1, |max| max + 1);
        Ok(Self {
            comments: RefCell::new(comments),
            next_id: Cell::new(next_id),
        })
    }

    fn with_comment<T>(
        &self,
        id: &CommentId,
        f: impl FnOnce(&mut Vec<CommentRecord>, usize) -> T,
    ) -> Result<T, ProviderError> {
        let mut comments = self.comments.borrow_mut();
        let index = comments
            .iter()
            .position(|comment| &comment.id == id)
            .ok_or_else(|| ProviderError::NotFound(id.clone()))?;
        Ok(f(&mut comments, index))
    }
}

impl CommentProvider for JsonCommentProvider {
    async fn list_open_comments(&self, _page_id: &str) -> Result<Vec<CommentRecord>, ProviderError> {
        Ok(self
            .comments
            .borrow()
            .iter()
            .filter(|comment| comment.status == CommentStatus::Open)
            .cloned()
            .collect())
    }

    async fn get_comment(&self, id: &CommentId) -> Result<CommentRecord, ProviderError> {
        self.with_comment(id, |comments, index| comments[index].clone())
    }

    async fn create_comment(
        &self,
        _page_id: &str,
        comment: NewComment,
    ) -> Result<CreatedComment, ProviderError> {
        let id = CommentId::from(self.next_id.replace(self.next_id.get() + 1));
        let mut record = CommentRecord::new(id.clone(), comment.pos);
        record.text = comment.text;
        record.parent_id = comment.parent_id;
        self.comments.borrow_mut().push(record);
        Ok(CreatedComment {
            success: true,
            id: Some(id),
        })
    }

    async fn update_comment(
        &self,
        id: &CommentId,
        status: CommentStatus,
        text: Option<&str>,
    ) -> Result<(), ProviderError> {
        self.with_comment(id, |comments, index| {
            let comment = &mut comments[index];
            comment.status = status;
            if let Some(text) = text {
                comment.text = text.to_string();
            }
        })
    }

    async fn delete_comment(&self, id: &CommentId) -> Result<(), ProviderError> {
        self.with_comment(id, |comments, index| {
            comments.remove(index);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_mixed_id_types() {
        let provider = JsonCommentProvider::from_json(
            r#"[
                {"id": 4, "pos": "beta|0", "author": "Ada", "text": "Source?", "page": "Main"},
                {"id": "9", "pos": null, "status": "completed"}
            ]"#,
        )
        .unwrap();
        let open = pollster::block_on(provider.list_open_comments("Main")).unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, CommentId::from(4));
        assert_eq!(open[0].extra.get("page"), Some(&serde_json::json!("Main")));

        let created = pollster::block_on(provider.create_comment(
            "Main",
            NewComment {
                pos: "x|0".to_string(),
                text: String::new(),
                parent_id: None,
                image: None,
            },
        ))
        .unwrap();
        assert_eq!(created.id, Some(CommentId::from(10)));
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(matches!(
            JsonCommentProvider::from_json("{"),
            Err(ProviderError::Malformed(_))
        ));
    }
}
