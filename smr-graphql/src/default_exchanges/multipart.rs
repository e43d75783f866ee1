use super::transport::{execute, payload_for, wants_get, FetchError, Payload, RequestBody};
use crate::{
    exchange::{Client, Exchange, ExchangeFactory, ExchangeResult, Operation, OperationResult},
    FileUpload, GraphQLQuery, OperationType, QueryBody
};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// The terminating transport.
///
/// Operations with file uploads are sent as `multipart/form-data` following the
/// [GraphQL multipart request spec](https://github.com/jaydenseric/graphql-multipart-request-spec),
/// everything else as a JSON POST (or GET, if the fetch options ask for it).
pub struct MultipartFetchExchange;

impl<TNext: Exchange> ExchangeFactory<TNext> for MultipartFetchExchange {
    type Output = MultipartFetchExchangeImpl;

    fn build(self, _next: TNext) -> Self::Output {
        MultipartFetchExchangeImpl {
            http: reqwest::Client::new()
        }
    }
}

pub struct MultipartFetchExchangeImpl {
    http: reqwest::Client
}

/// Build the form for an operation with uploads: `operations`, then `map`, then one part per
/// file, named by its index in `map`.
pub(crate) fn multipart_form<V: Serialize + Send + Sync + Clone>(
    query: &QueryBody<V>,
    uploads: Vec<FileUpload>
) -> Result<Form, FetchError> {
    let operations = serde_json::to_string(query).map_err(FetchError::Encode)?;
    let map: BTreeMap<String, Vec<String>> = uploads
        .iter()
        .enumerate()
        .map(|(index, upload)| (index.to_string(), vec![upload.path.clone()]))
        .collect();
    let map = serde_json::to_string(&map).map_err(FetchError::Encode)?;

    let mut form = Form::new().text("operations", operations).text("map", map);
    for (index, upload) in uploads.into_iter().enumerate() {
        let mut part = Part::bytes(upload.file.content.as_ref().clone())
            .file_name(upload.file.file_name);
        if let Some(content_type) = &upload.file.content_type {
            part = part.mime_str(content_type)?;
        }
        form = form.part(index.to_string(), part);
    }
    Ok(form)
}

#[async_trait]
impl Exchange for MultipartFetchExchangeImpl {
    async fn run<Q: GraphQLQuery, C: Client>(
        &self,
        operation: Operation<Q::Variables>,
        _client: C
    ) -> ExchangeResult<Q::ResponseData> {
        let options = operation.resolved_fetch_options();
        let uploads = Q::uploads(&operation.query.variables);
        let url = operation.options.url.as_str();

        let payload = if uploads.is_empty() {
            let body = RequestBody {
                query: Some(operation.query.query),
                operation_name: operation.query.operation_name,
                variables: &operation.query.variables,
                extensions: None
            };
            let prefer_get = operation.meta.operation_type == OperationType::Query
                && wants_get(&options, false);
            payload_for(url, &body, prefer_get)?
        } else {
            debug!(
                operation = operation.meta.operation_name,
                files = uploads.len(),
                "sending multipart request"
            );
            Payload::Multipart(multipart_form(&operation.query, uploads)?)
        };

        let response = execute(&self.http, url, payload, &options).await?;

        Ok(OperationResult {
            key: operation.key,
            meta: operation.meta,
            response
        })
    }
}
