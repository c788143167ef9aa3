use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, instrument, warn};

use agegate_core::{ChannelId, GuildId, RoleId, UserId};
use agegate_guild::{ChannelMessage, GuildActions, GuildError, GuildMember};

use crate::config::DiscordConfig;
use crate::types::{ApiErrorBody, CreateBan, CreateDm, CreateMessage, DmChannel, MemberObject};

/// Page size for member listing; the API maximum.
const MEMBER_PAGE_LIMIT: usize = 1000;

/// Fallback wait when a rate-limit response carries no usable delay.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// [`GuildActions`] backed by the Discord REST API, v10.
///
/// One instance holds one bot token and serves any guild that bot is in.
/// Moderation calls carry their reason in the `X-Audit-Log-Reason` header so
/// it lands in Discord's own audit log too.
pub struct DiscordGuild {
    config: DiscordConfig,
    client: Client,
}

impl DiscordGuild {
    /// Create a new adapter with the given configuration.
    pub fn new(config: DiscordConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");
        Self { config, client }
    }

    /// Create a new adapter with a custom HTTP client.
    pub fn with_client(config: DiscordConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_base)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.header("Authorization", format!("Bot {}", self.config.token))
    }

    /// Check a response we only need the status of.
    async fn expect_ok(&self, response: Response) -> Result<(), GuildError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(error_for(status, response).await)
    }

    async fn post_message(
        &self,
        channel: &str,
        message: &ChannelMessage,
    ) -> Result<(), GuildError> {
        let body = CreateMessage::from(message);
        let response = self
            .authed(
                self.client
                    .post(self.url(&format!("/channels/{channel}/messages"))),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| GuildError::Http(e.to_string()))?;
        self.expect_ok(response).await
    }
}

/// Map a failed response onto the guild error taxonomy.
async fn error_for(status: StatusCode, response: Response) -> GuildError {
    let body = response.json::<ApiErrorBody>().await.unwrap_or_default();
    let message = if body.message.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        body.message
    };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GuildError::PermissionDenied(message),
        StatusCode::NOT_FOUND => GuildError::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => {
            warn!("discord rate limit hit");
            let retry_after = body
                .retry_after
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .unwrap_or(DEFAULT_RETRY_AFTER);
            GuildError::RateLimited { retry_after }
        }
        _ => GuildError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl GuildActions for DiscordGuild {
    #[instrument(skip(self, reason), fields(guild = %guild, user = %user, role = %role))]
    async fn add_role(
        &self,
        guild: &GuildId,
        user: &UserId,
        role: &RoleId,
        reason: &str,
    ) -> Result<(), GuildError> {
        let response = self
            .authed(
                self.client
                    .put(self.url(&format!("/guilds/{guild}/members/{user}/roles/{role}"))),
            )
            .header("X-Audit-Log-Reason", reason)
            .send()
            .await
            .map_err(|e| GuildError::Http(e.to_string()))?;
        self.expect_ok(response).await
    }

    #[instrument(skip(self, reason), fields(guild = %guild, user = %user, role = %role))]
    async fn remove_role(
        &self,
        guild: &GuildId,
        user: &UserId,
        role: &RoleId,
        reason: &str,
    ) -> Result<(), GuildError> {
        let response = self
            .authed(
                self.client
                    .delete(self.url(&format!("/guilds/{guild}/members/{user}/roles/{role}"))),
            )
            .header("X-Audit-Log-Reason", reason)
            .send()
            .await
            .map_err(|e| GuildError::Http(e.to_string()))?;
        self.expect_ok(response).await
    }

    #[instrument(skip(self, reason), fields(guild = %guild, user = %user))]
    async fn ban(&self, guild: &GuildId, user: &UserId, reason: &str) -> Result<(), GuildError> {
        let response = self
            .authed(
                self.client
                    .put(self.url(&format!("/guilds/{guild}/bans/{user}"))),
            )
            .header("X-Audit-Log-Reason", reason)
            .json(&CreateBan {
                delete_message_seconds: 0,
            })
            .send()
            .await
            .map_err(|e| GuildError::Http(e.to_string()))?;
        self.expect_ok(response).await
    }

    #[instrument(skip(self, reason), fields(guild = %guild, user = %user))]
    async fn unban(&self, guild: &GuildId, user: &UserId, reason: &str) -> Result<(), GuildError> {
        let response = self
            .authed(
                self.client
                    .delete(self.url(&format!("/guilds/{guild}/bans/{user}"))),
            )
            .header("X-Audit-Log-Reason", reason)
            .send()
            .await
            .map_err(|e| GuildError::Http(e.to_string()))?;
        self.expect_ok(response).await
    }

    #[instrument(skip(self, reason), fields(guild = %guild, user = %user))]
    async fn kick(&self, guild: &GuildId, user: &UserId, reason: &str) -> Result<(), GuildError> {
        let response = self
            .authed(
                self.client
                    .delete(self.url(&format!("/guilds/{guild}/members/{user}"))),
            )
            .header("X-Audit-Log-Reason", reason)
            .send()
            .await
            .map_err(|e| GuildError::Http(e.to_string()))?;
        self.expect_ok(response).await
    }

    #[instrument(skip(self, message), fields(channel = %channel))]
    async fn send_channel_message(
        &self,
        channel: &ChannelId,
        message: &ChannelMessage,
    ) -> Result<(), GuildError> {
        self.post_message(channel.as_str(), message).await
    }

    #[instrument(skip(self, message), fields(user = %user))]
    async fn send_dm(&self, user: &UserId, message: &ChannelMessage) -> Result<(), GuildError> {
        let response = self
            .authed(self.client.post(self.url("/users/@me/channels")))
            .json(&CreateDm {
                recipient_id: user.as_str(),
            })
            .send()
            .await
            .map_err(|e| GuildError::Http(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(error_for(status, response).await);
        }
        let dm: DmChannel = response
            .json()
            .await
            .map_err(|e| GuildError::Http(e.to_string()))?;
        self.post_message(&dm.id, message).await
    }

    #[instrument(skip(self), fields(guild = %guild, role = %role))]
    async fn members_with_role(
        &self,
        guild: &GuildId,
        role: &RoleId,
    ) -> Result<Vec<GuildMember>, GuildError> {
        let mut members = Vec::new();
        let mut after = String::new();
        loop {
            let mut path = format!("/guilds/{guild}/members?limit={MEMBER_PAGE_LIMIT}");
            if !after.is_empty() {
                path.push_str("&after=");
                path.push_str(&after);
            }
            let response = self
                .authed(self.client.get(self.url(&path)))
                .send()
                .await
                .map_err(|e| GuildError::Http(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(error_for(status, response).await);
            }
            let page: Vec<MemberObject> = response
                .json()
                .await
                .map_err(|e| GuildError::Http(e.to_string()))?;
            let full_page = page.len() == MEMBER_PAGE_LIMIT;
            if let Some(last) = page.last() {
                after = last.user.id.clone();
            }
            for member in page {
                if member.roles.iter().any(|r| r == role.as_str()) {
                    members.push(GuildMember::new(member.user.id, member.joined_at));
                }
            }
            if !full_page {
                break;
            }
        }
        debug!(count = members.len(), "member listing complete");
        Ok(members)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "discord"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockDiscordServer {
        listener: tokio::net::TcpListener,
        base_url: String,
    }

    impl MockDiscordServer {
        async fn start() -> Self {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("failed to bind mock server");
            let port = listener.local_addr().unwrap().port();
            let base_url = format!("http://127.0.0.1:{port}");
            Self { listener, base_url }
        }

        /// Serve one request and return its raw text.
        async fn respond_once(self, status_code: u16, body: &str) -> String {
            let mut requests = self
                .respond_sequence(vec![(status_code, body.to_owned())])
                .await;
            requests.remove(0)
        }

        /// Serve one request per response, in order, returning the raw
        /// request texts.
        async fn respond_sequence(self, responses: Vec<(u16, String)>) -> Vec<String> {
            use tokio::io::AsyncWriteExt;

            let mut requests = Vec::new();
            for (status_code, body) in responses {
                let (mut stream, _) = self.listener.accept().await.unwrap();
                requests.push(read_request(&mut stream).await);

                let content_type = if body.is_empty() {
                    "text/plain"
                } else {
                    "application/json"
                };
                let response = format!(
                    "HTTP/1.1 {status_code} OK\r\n\
                     Content-Type: {content_type}\r\n\
                     Content-Length: {}\r\n\
                     Connection: close\r\n\
                     \r\n\
                     {body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();
            }
            requests
        }
    }

    /// Read a full HTTP request, headers plus declared body.
    async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
        use tokio::io::AsyncReadExt;

        let mut data = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);
            if let Some(header_end) = data.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&data[..header_end]).to_lowercase();
                let content_length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if data.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).to_string()
    }

    fn adapter(base_url: &str) -> DiscordGuild {
        DiscordGuild::new(DiscordConfig::new("test-token").with_api_base(base_url))
    }

    #[test]
    fn adapter_name() {
        let guild = adapter("http://localhost:1");
        assert_eq!(guild.name(), "discord");
    }

    #[tokio::test]
    async fn add_role_hits_member_role_endpoint() {
        let server = MockDiscordServer::start().await;
        let guild = adapter(&server.base_url);

        let server_handle = tokio::spawn(async move { server.respond_once(204, "").await });

        guild
            .add_role(
                &GuildId::new("guild-1"),
                &UserId::new("user-9"),
                &RoleId::new("role-13"),
                "verification approved",
            )
            .await
            .expect("add_role should succeed");

        let request = server_handle.await.unwrap();
        assert!(request.starts_with("PUT /guilds/guild-1/members/user-9/roles/role-13"));
        assert!(request.to_lowercase().contains("authorization: bot test-token"));
        assert!(request
            .to_lowercase()
            .contains("x-audit-log-reason: verification approved"));
    }

    #[tokio::test]
    async fn ban_sends_reason_and_body() {
        let server = MockDiscordServer::start().await;
        let guild = adapter(&server.base_url);

        let server_handle = tokio::spawn(async move { server.respond_once(204, "").await });

        guild
            .ban(
                &GuildId::new("guild-1"),
                &UserId::new("user-9"),
                "User does not meet minimum age requirement (13+)",
            )
            .await
            .expect("ban should succeed");

        let request = server_handle.await.unwrap();
        assert!(request.starts_with("PUT /guilds/guild-1/bans/user-9"));
        assert!(request.contains(r#""delete_message_seconds":0"#));
        assert!(request
            .to_lowercase()
            .contains("x-audit-log-reason: user does not meet minimum age requirement (13+)"));
    }

    #[tokio::test]
    async fn kick_uses_member_delete() {
        let server = MockDiscordServer::start().await;
        let guild = adapter(&server.base_url);

        let server_handle = tokio::spawn(async move { server.respond_once(204, "").await });

        guild
            .kick(
                &GuildId::new("guild-1"),
                &UserId::new("user-9"),
                "Not verified within 7 days",
            )
            .await
            .expect("kick should succeed");

        let request = server_handle.await.unwrap();
        assert!(request.starts_with("DELETE /guilds/guild-1/members/user-9"));
    }

    #[tokio::test]
    async fn channel_message_serializes_embed() {
        let server = MockDiscordServer::start().await;
        let guild = adapter(&server.base_url);

        let message = ChannelMessage::text("@here").with_embed(
            agegate_guild::MessageEmbed::new()
                .with_title("New verification submission")
                .with_color(agegate_guild::color::RED),
        );

        let server_handle = tokio::spawn(async move { server.respond_once(200, "{}").await });

        guild
            .send_channel_message(&ChannelId::new("chan-modlog"), &message)
            .await
            .expect("message should post");

        let request = server_handle.await.unwrap();
        assert!(request.starts_with("POST /channels/chan-modlog/messages"));
        assert!(request.contains(r#""content":"@here""#));
        assert!(request.contains(r#""title":"New verification submission""#));
    }

    #[tokio::test]
    async fn dm_opens_channel_then_posts() {
        let server = MockDiscordServer::start().await;
        let guild = adapter(&server.base_url);

        let server_handle = tokio::spawn(async move {
            server
                .respond_sequence(vec![
                    (200, r#"{"id":"dm-chan-1"}"#.to_owned()),
                    (200, "{}".to_owned()),
                ])
                .await
        });

        guild
            .send_dm(
                &UserId::new("user-9"),
                &ChannelMessage::text("Thanks for your submission."),
            )
            .await
            .expect("dm should send");

        let requests = server_handle.await.unwrap();
        assert!(requests[0].starts_with("POST /users/@me/channels"));
        assert!(requests[0].contains(r#""recipient_id":"user-9""#));
        assert!(requests[1].starts_with("POST /channels/dm-chan-1/messages"));
    }

    #[tokio::test]
    async fn member_listing_filters_by_role() {
        let server = MockDiscordServer::start().await;
        let guild = adapter(&server.base_url);

        let body = r#"[
            {"user":{"id":"1"},"roles":["role-unverified"],"joined_at":"2026-08-01T10:00:00Z"},
            {"user":{"id":"2"},"roles":["role-13"],"joined_at":"2026-08-02T10:00:00Z"},
            {"user":{"id":"3"},"roles":["role-unverified","role-x"],"joined_at":"2026-08-03T10:00:00Z"}
        ]"#;
        let server_handle = tokio::spawn(async move { server.respond_once(200, body).await });

        let members = guild
            .members_with_role(&GuildId::new("guild-1"), &RoleId::new("role-unverified"))
            .await
            .expect("listing should succeed");

        let request = server_handle.await.unwrap();
        assert!(request.starts_with("GET /guilds/guild-1/members?limit=1000"));
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].user.as_str(), "1");
        assert_eq!(members[1].user.as_str(), "3");
    }

    #[tokio::test]
    async fn forbidden_maps_to_permission_denied() {
        let server = MockDiscordServer::start().await;
        let guild = adapter(&server.base_url);

        let server_handle = tokio::spawn(async move {
            server
                .respond_once(403, r#"{"message":"Missing Permissions"}"#)
                .await
        });

        let err = guild
            .ban(&GuildId::new("guild-1"), &UserId::new("user-9"), "test")
            .await
            .unwrap_err();
        server_handle.await.unwrap();

        assert!(!err.is_retryable());
        match err {
            GuildError::PermissionDenied(message) => {
                assert_eq!(message, "Missing Permissions");
            }
            other => panic!("expected permission denial, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_member_maps_to_not_found() {
        let server = MockDiscordServer::start().await;
        let guild = adapter(&server.base_url);

        let server_handle = tokio::spawn(async move {
            server
                .respond_once(404, r#"{"message":"Unknown Member"}"#)
                .await
        });

        let err = guild
            .kick(&GuildId::new("guild-1"), &UserId::new("user-9"), "test")
            .await
            .unwrap_err();
        server_handle.await.unwrap();

        assert!(matches!(err, GuildError::NotFound(_)));
    }

    #[tokio::test]
    async fn rate_limit_carries_retry_after() {
        let server = MockDiscordServer::start().await;
        let guild = adapter(&server.base_url);

        let server_handle = tokio::spawn(async move {
            server
                .respond_once(
                    429,
                    r#"{"message":"You are being rate limited.","retry_after":2.5,"global":false}"#,
                )
                .await
        });

        let err = guild
            .add_role(
                &GuildId::new("guild-1"),
                &UserId::new("user-9"),
                &RoleId::new("role-13"),
                "test",
            )
            .await
            .unwrap_err();
        server_handle.await.unwrap();

        assert!(err.is_retryable());
        match err {
            GuildError::RateLimited { retry_after } => {
                assert_eq!(retry_after, Duration::from_millis(2500));
            }
            other => panic!("expected rate limit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unexpected_status_maps_to_api_error() {
        let server = MockDiscordServer::start().await;
        let guild = adapter(&server.base_url);

        let server_handle = tokio::spawn(async move {
            server
                .respond_once(400, r#"{"message":"Invalid Form Body"}"#)
                .await
        });

        let err = guild
            .unban(&GuildId::new("guild-1"), &UserId::new("user-9"), "test")
            .await
            .unwrap_err();
        server_handle.await.unwrap();

        match err {
            GuildError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid Form Body");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }
}
