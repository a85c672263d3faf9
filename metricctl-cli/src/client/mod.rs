//! gRPC client for the metrics service

use async_trait::async_trait;
use metricctl_api::v1::metric_service_client::MetricServiceClient;
use metricctl_api::v1::*;
use metricctl_core::observability::metrics;
use metricctl_core::{Config, MetricBackend, MonitoringError, Result};
use std::collections::HashSet;
use std::future::Future;
use std::time::Instant;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::service::interceptor::InterceptedService;
use tonic::service::Interceptor;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint, Uri};
use tonic::{Request, Status};
use tracing::{debug, instrument};

/// Attaches `authorization: Bearer <token>` to every call when a token is set.
#[derive(Clone, Default)]
pub struct BearerAuth {
    header: Option<MetadataValue<Ascii>>,
}

impl BearerAuth {
    pub fn new(token: Option<&str>) -> Result<Self> {
        let header = token
            .map(|t| {
                format!("Bearer {}", t).parse::<MetadataValue<Ascii>>().map_err(|_| {
                    MonitoringError::InvalidConfig {
                        reason: "access token contains characters not allowed in a header"
                            .to_string(),
                    }
                })
            })
            .transpose()?;
        Ok(Self { header })
    }
}

impl Interceptor for BearerAuth {
    fn call(&mut self, mut request: Request<()>) -> std::result::Result<Request<()>, Status> {
        if let Some(header) = &self.header {
            request.metadata_mut().insert("authorization", header.clone());
        }
        Ok(request)
    }
}

type Client = MetricServiceClient<InterceptedService<Channel, BearerAuth>>;

/// `MetricBackend` over tonic.
pub struct GrpcBackend {
    client: Client,
    page_size: i32,
}

impl GrpcBackend {
    /// Connect to `config.endpoint`.
    ///
    /// `https://` endpoints use TLS with the platform's native roots;
    /// `unix:<path>` connects over a Unix domain socket.
    pub async fn connect(config: &Config) -> Result<Self> {
        let endpoint = config.endpoint.as_str();
        let transport_error =
            |source| MonitoringError::Transport { endpoint: endpoint.to_string(), source };

        let channel = if let Some(path) = endpoint.strip_prefix("unix:") {
            let path = path.to_string();
            // The URI is required by tonic but unused for Unix sockets
            Endpoint::try_from("http://[::]:50051")
                .map_err(transport_error)?
                .connect_timeout(config.connect_timeout())
                .timeout(config.request_timeout())
                .connect_with_connector(tower::service_fn(move |_: Uri| {
                    let path = path.clone();
                    async move {
                        let stream = tokio::net::UnixStream::connect(path).await?;
                        Ok::<_, std::io::Error>(hyper_util::rt::TokioIo::new(stream))
                    }
                }))
                .await
                .map_err(transport_error)?
        } else {
            let mut builder = Endpoint::from_shared(endpoint.to_string())
                .map_err(transport_error)?
                .connect_timeout(config.connect_timeout())
                .timeout(config.request_timeout());
            if endpoint.starts_with("https://") {
                builder = builder
                    .tls_config(ClientTlsConfig::new().with_native_roots())
                    .map_err(transport_error)?;
            }
            builder.connect().await.map_err(transport_error)?
        };

        debug!(endpoint, "Connected to metrics service");
        Self::with_channel(channel, config.access_token.as_deref(), config.page_size)
    }

    /// Wrap an established channel.
    pub fn with_channel(channel: Channel, token: Option<&str>, page_size: i32) -> Result<Self> {
        let client = MetricServiceClient::with_interceptor(channel, BearerAuth::new(token)?);
        Ok(Self { client, page_size })
    }
}

/// Time one logical call and record its outcome.
async fn observe<T, F>(method: &'static str, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let start = Instant::now();
    let result = call.await;
    let status = match &result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    metrics::record_rpc(method, status, start.elapsed());
    result
}

/// Page tokens already sent during one list call.
///
/// A server that hands back any of them would loop forever.
struct PageTokens {
    sent: HashSet<String>,
}

impl PageTokens {
    fn new(first: &str) -> Self {
        Self { sent: HashSet::from([first.to_string()]) }
    }

    /// The token for the next page, or `None` once the listing is exhausted.
    fn next(&mut self, next: String) -> Result<Option<String>> {
        if next.is_empty() {
            return Ok(None);
        }
        if !self.sent.insert(next.clone()) {
            return Err(MonitoringError::invalid_response(format!(
                "page token '{}' repeated",
                next
            )));
        }
        Ok(Some(next))
    }
}

#[async_trait]
impl MetricBackend for GrpcBackend {
    #[instrument(skip(self, request), fields(name = %request.name))]
    async fn create_metric_descriptor(
        &self,
        request: CreateMetricDescriptorRequest,
    ) -> Result<MetricDescriptor> {
        observe("CreateMetricDescriptor", async {
            let mut client = self.client.clone();
            Ok(client.create_metric_descriptor(request).await?.into_inner())
        })
        .await
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    async fn list_metric_descriptors(
        &self,
        mut request: ListMetricDescriptorsRequest,
    ) -> Result<Vec<MetricDescriptor>> {
        observe("ListMetricDescriptors", async {
            let mut client = self.client.clone();
            if request.page_size == 0 {
                request.page_size = self.page_size;
            }

            let mut tokens = PageTokens::new(&request.page_token);
            let mut descriptors = Vec::new();
            loop {
                let page = client.list_metric_descriptors(request.clone()).await?.into_inner();
                descriptors.extend(page.metric_descriptors);
                match tokens.next(page.next_page_token)? {
                    Some(token) => request.page_token = token,
                    None => break,
                }
            }
            Ok(descriptors)
        })
        .await
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    async fn get_metric_descriptor(
        &self,
        request: GetMetricDescriptorRequest,
    ) -> Result<MetricDescriptor> {
        observe("GetMetricDescriptor", async {
            let mut client = self.client.clone();
            Ok(client.get_metric_descriptor(request).await?.into_inner())
        })
        .await
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    async fn delete_metric_descriptor(&self, request: DeleteMetricDescriptorRequest) -> Result<()> {
        observe("DeleteMetricDescriptor", async {
            let mut client = self.client.clone();
            client.delete_metric_descriptor(request).await?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self, request), fields(name = %request.name, series = request.time_series.len()))]
    async fn create_time_series(&self, request: CreateTimeSeriesRequest) -> Result<()> {
        observe("CreateTimeSeries", async {
            let mut client = self.client.clone();
            client.create_time_series(request).await?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self, request), fields(name = %request.name, filter = %request.filter))]
    async fn list_time_series(&self, mut request: ListTimeSeriesRequest) -> Result<Vec<TimeSeries>> {
        observe("ListTimeSeries", async {
            let mut client = self.client.clone();
            if request.page_size == 0 {
                request.page_size = self.page_size;
            }

            let mut tokens = PageTokens::new(&request.page_token);
            let mut series = Vec::new();
            loop {
                let page = client.list_time_series(request.clone()).await?.into_inner();
                series.extend(page.time_series);
                match tokens.next(page.next_page_token)? {
                    Some(token) => request.page_token = token,
                    None => break,
                }
            }
            Ok(series)
        })
        .await
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    async fn list_monitored_resource_descriptors(
        &self,
        mut request: ListMonitoredResourceDescriptorsRequest,
    ) -> Result<Vec<MonitoredResourceDescriptor>> {
        observe("ListMonitoredResourceDescriptors", async {
            let mut client = self.client.clone();
            if request.page_size == 0 {
                request.page_size = self.page_size;
            }

            let mut tokens = PageTokens::new(&request.page_token);
            let mut descriptors = Vec::new();
            loop {
                let page = client
                    .list_monitored_resource_descriptors(request.clone())
                    .await?
                    .into_inner();
                descriptors.extend(page.resource_descriptors);
                match tokens.next(page.next_page_token)? {
                    Some(token) => request.page_token = token,
                    None => break,
                }
            }
            Ok(descriptors)
        })
        .await
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    async fn get_monitored_resource_descriptor(
        &self,
        request: GetMonitoredResourceDescriptorRequest,
    ) -> Result<MonitoredResourceDescriptor> {
        observe("GetMonitoredResourceDescriptor", async {
            let mut client = self.client.clone();
            Ok(client.get_monitored_resource_descriptor(request).await?.into_inner())
        })
        .await
    }

    fn name(&self) -> &str {
        "grpc"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metricctl_api::v1::metric_service_server::{MetricService, MetricServiceServer};
    use std::net::SocketAddr;
    use std::time::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;
    use tokio_stream::wrappers::TcpListenerStream;
    use tonic::Response;

    /// Serves three descriptors over two pages and records the auth header.
    #[derive(Default)]
    struct PagedService {
        seen_auth: Arc<Mutex<Vec<Option<String>>>>,
        time_series_calls: Arc<AtomicUsize>,
    }

    fn descriptor(metric_type: &str) -> MetricDescriptor {
        MetricDescriptor {
            name: format!("projects/p1/metricDescriptors/{}", metric_type),
            r#type: metric_type.to_string(),
            metric_kind: MetricKind::Gauge as i32,
            value_type: ValueType::Double as i32,
            ..Default::default()
        }
    }

    #[tonic::async_trait]
    impl MetricService for PagedService {
        async fn create_metric_descriptor(
            &self,
            request: Request<CreateMetricDescriptorRequest>,
        ) -> std::result::Result<Response<MetricDescriptor>, Status> {
            let descriptor = request.into_inner().metric_descriptor.unwrap_or_default();
            Err(Status::already_exists(format!("{} already exists", descriptor.r#type)))
        }

        async fn list_metric_descriptors(
            &self,
            request: Request<ListMetricDescriptorsRequest>,
        ) -> std::result::Result<Response<ListMetricDescriptorsResponse>, Status> {
            let auth = request
                .metadata()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            self.seen_auth.lock().unwrap().push(auth);

            let request = request.into_inner();
            assert_eq!(request.page_size, 2);
            let response = match request.page_token.as_str() {
                "" => ListMetricDescriptorsResponse {
                    metric_descriptors: vec![
                        descriptor("custom.googleapis.com/a"),
                        descriptor("custom.googleapis.com/b"),
                    ],
                    next_page_token: "page-2".to_string(),
                },
                "page-2" => ListMetricDescriptorsResponse {
                    metric_descriptors: vec![descriptor("custom.googleapis.com/c")],
                    next_page_token: String::new(),
                },
                other => return Err(Status::invalid_argument(format!("bad token {}", other))),
            };
            Ok(Response::new(response))
        }

        async fn get_metric_descriptor(
            &self,
            request: Request<GetMetricDescriptorRequest>,
        ) -> std::result::Result<Response<MetricDescriptor>, Status> {
            Err(Status::not_found(format!("{} does not exist", request.into_inner().name)))
        }

        async fn delete_metric_descriptor(
            &self,
            _request: Request<DeleteMetricDescriptorRequest>,
        ) -> std::result::Result<Response<DeleteMetricDescriptorResponse>, Status> {
            Ok(Response::new(DeleteMetricDescriptorResponse {}))
        }

        async fn create_time_series(
            &self,
            _request: Request<CreateTimeSeriesRequest>,
        ) -> std::result::Result<Response<CreateTimeSeriesResponse>, Status> {
            Ok(Response::new(CreateTimeSeriesResponse {}))
        }

        async fn list_time_series(
            &self,
            request: Request<ListTimeSeriesRequest>,
        ) -> std::result::Result<Response<ListTimeSeriesResponse>, Status> {
            // Misbehaving server: "repeat" hands back the same token, anything
            // else cycles "" -> A -> B -> A.
            self.time_series_calls.fetch_add(1, Ordering::SeqCst);
            let request = request.into_inner();
            let next_page_token = match (request.filter.as_str(), request.page_token.as_str()) {
                ("repeat", _) => "again",
                (_, "A") => "B",
                _ => "A",
            };
            Ok(Response::new(ListTimeSeriesResponse {
                time_series: Vec::new(),
                next_page_token: next_page_token.to_string(),
            }))
        }

        async fn list_monitored_resource_descriptors(
            &self,
            _request: Request<ListMonitoredResourceDescriptorsRequest>,
        ) -> std::result::Result<Response<ListMonitoredResourceDescriptorsResponse>, Status> {
            Err(Status::unimplemented("not served"))
        }

        async fn get_monitored_resource_descriptor(
            &self,
            _request: Request<GetMonitoredResourceDescriptorRequest>,
        ) -> std::result::Result<Response<MonitoredResourceDescriptor>, Status> {
            Err(Status::unimplemented("not served"))
        }
    }

    async fn serve(service: PagedService) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            tonic::transport::Server::builder()
                .add_service(MetricServiceServer::new(service))
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await
                .unwrap();
        });
        addr
    }

    fn config(addr: SocketAddr, token: Option<&str>) -> Config {
        Config {
            endpoint: format!("http://{}", addr),
            access_token: token.map(str::to_string),
            page_size: 2,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_list_follows_pagination_with_auth() {
        let service = PagedService::default();
        let seen_auth = service.seen_auth.clone();
        let addr = serve(service).await;

        let backend = GrpcBackend::connect(&config(addr, Some("secret"))).await.unwrap();
        let descriptors = backend
            .list_metric_descriptors(ListMetricDescriptorsRequest {
                name: "projects/p1".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let types: Vec<_> = descriptors.iter().map(|d| d.r#type.as_str()).collect();
        assert_eq!(
            types,
            ["custom.googleapis.com/a", "custom.googleapis.com/b", "custom.googleapis.com/c"]
        );

        let seen = seen_auth.lock().unwrap().clone();
        assert_eq!(seen, vec![Some("Bearer secret".to_string()); 2]);
    }

    #[tokio::test]
    async fn test_status_codes_map_to_errors() {
        let addr = serve(PagedService::default()).await;
        let backend = GrpcBackend::connect(&config(addr, None)).await.unwrap();

        let err = backend
            .get_metric_descriptor(GetMetricDescriptorRequest {
                name: "projects/p1/metricDescriptors/custom.googleapis.com/missing".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MonitoringError::NotFound { ref message } if message.contains("missing")));

        let err = backend
            .create_metric_descriptor(CreateMetricDescriptorRequest {
                name: "projects/p1".to_string(),
                metric_descriptor: Some(descriptor("custom.googleapis.com/a")),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MonitoringError::AlreadyExists { .. }));

        let err = backend
            .list_monitored_resource_descriptors(ListMonitoredResourceDescriptorsRequest {
                name: "projects/p1".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MonitoringError::Rpc { code: tonic::Code::Unimplemented, .. }));
    }

    #[tokio::test]
    async fn test_repeated_page_token_is_invalid_response() {
        let addr = serve(PagedService::default()).await;
        let backend = GrpcBackend::connect(&config(addr, None)).await.unwrap();

        let err = backend
            .list_time_series(ListTimeSeriesRequest {
                name: "projects/p1".to_string(),
                filter: "repeat".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MonitoringError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_cycling_page_tokens_are_invalid_response() {
        let service = PagedService::default();
        let calls = service.time_series_calls.clone();
        let addr = serve(service).await;
        let backend = GrpcBackend::connect(&config(addr, None)).await.unwrap();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            backend.list_time_series(ListTimeSeriesRequest {
                name: "projects/p1".to_string(),
                filter: "cycle".to_string(),
                ..Default::default()
            }),
        )
        .await
        .expect("listing must stop on a token cycle");

        assert!(matches!(result, Err(MonitoringError::InvalidResponse { .. })));
        // "" -> A, A -> B, B -> A (already sent)
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_page_tokens() {
        let mut tokens = PageTokens::new("");
        assert_eq!(tokens.next("A".to_string()).unwrap().as_deref(), Some("A"));
        assert_eq!(tokens.next("B".to_string()).unwrap().as_deref(), Some("B"));
        assert!(tokens.next("A".to_string()).is_err());
        assert_eq!(tokens.next(String::new()).unwrap(), None);

        let mut tokens = PageTokens::new("resume");
        assert!(tokens.next("resume".to_string()).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = GrpcBackend::connect(&config(addr, None)).await.err().unwrap();
        assert!(err.is_transient());
    }

    #[test]
    fn test_bearer_auth_rejects_invalid_token() {
        assert!(BearerAuth::new(Some("line\nbreak")).is_err());
        assert!(BearerAuth::new(None).is_ok());
    }
}
