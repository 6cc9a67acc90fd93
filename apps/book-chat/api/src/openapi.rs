use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(info(
    title = "Book Chat API",
    description = "Retrieval over a book's pgvector chunk store"
))]
struct ServiceInfo;

/// Top-level API documentation: service info plus the chat paths at the root.
pub struct ApiDoc;

impl OpenApi for ApiDoc {
    fn openapi() -> utoipa::openapi::OpenApi {
        let mut doc = ServiceInfo::openapi();
        doc.merge(domain_retrieval::ApiDoc::openapi());
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_path_is_served_at_root() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/chat"));
        assert!(!doc.paths.paths.contains_key("/api/chat"));
        assert_eq!(doc.info.title, "Book Chat API");
    }
}
