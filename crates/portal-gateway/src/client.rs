//! Login and logout orchestration against a NAS
//!
//! [`PortalClient`] strings the protocol exchanges together: the challenge
//! round, the CHAP or PAP authentication request, the affirmative ack, and
//! acknowledgement of logout notifications pushed by the NAS.

use crate::error::PortalError;
use crate::transport::{PortalTransport, UnsolicitedHandler};
use async_trait::async_trait;
use portal_proto::{AuthMethod, Message, MessageType, verify_authenticator};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Portal side of the protocol, bound to one transport and shared secret
#[derive(Clone)]
pub struct PortalClient {
    transport: Arc<PortalTransport>,
    secret: Arc<str>,
    nas_port: u16,
    auth_method: AuthMethod,
}

impl PortalClient {
    pub fn new(transport: Arc<PortalTransport>, secret: &str, nas_port: u16) -> Self {
        PortalClient {
            transport,
            secret: Arc::from(secret),
            nas_port,
            auth_method: AuthMethod::default(),
        }
    }

    pub fn with_auth_method(mut self, method: AuthMethod) -> Self {
        self.auth_method = method;
        self
    }

    pub fn auth_method(&self) -> AuthMethod {
        self.auth_method
    }

    pub fn transport(&self) -> &Arc<PortalTransport> {
        &self.transport
    }

    fn nas_addr(&self, nas_ip: IpAddr) -> SocketAddr {
        SocketAddr::new(nas_ip, self.nas_port)
    }

    /// Ask the NAS for a CHAP challenge on behalf of `user_ip`
    pub async fn challenge(&self, user_ip: Ipv4Addr, nas_ip: IpAddr) -> Result<Message, PortalError> {
        let codec = self.transport.codec();
        self.transport
            .request(self.nas_addr(nas_ip), &self.secret, |serial| {
                Ok(codec.new_challenge(user_ip, &self.secret, serial))
            })
            .await
    }

    /// Log `user_ip` in with the configured authentication method
    ///
    /// Succeeds once the NAS has accepted the credentials and the
    /// affirmative ack has been written.
    pub async fn auth(
        &self,
        user_ip: Ipv4Addr,
        nas_ip: IpAddr,
        username: &[u8],
        password: &[u8],
    ) -> Result<(), PortalError> {
        let dest = self.nas_addr(nas_ip);
        let codec = self.transport.codec();

        let ack = match self.auth_method {
            AuthMethod::Chap => {
                let challenge_ack = self.challenge(user_ip, nas_ip).await?;
                let challenge = challenge_ack
                    .challenge()
                    .ok_or(PortalError::MissingChallenge {
                        serial_id: challenge_ack.serial_id(),
                    })?;
                let req_id = challenge_ack.req_id();

                self.transport
                    .request(dest, &self.secret, |serial| {
                        codec.new_auth(
                            user_ip,
                            &self.secret,
                            serial,
                            req_id,
                            username,
                            password,
                            challenge,
                        )
                    })
                    .await?
            }
            AuthMethod::Pap => {
                self.transport
                    .request(dest, &self.secret, |serial| {
                        codec.new_pap_auth(user_ip, &self.secret, serial, username, password)
                    })
                    .await?
            }
        };

        let aff_ack = codec.new_aff_ack_auth(user_ip, &self.secret, ack.serial_id(), ack.req_id());
        self.transport.send_async(&aff_ack, dest).await?;

        info!(
            user_ip = %user_ip,
            nas_ip = %nas_ip,
            method = %self.auth_method,
            "User authenticated"
        );
        Ok(())
    }

    /// Log `user_ip` out
    pub async fn logout(&self, user_ip: Ipv4Addr, nas_ip: IpAddr) -> Result<Message, PortalError> {
        let codec = self.transport.codec();
        let ack = self
            .transport
            .request(self.nas_addr(nas_ip), &self.secret, |serial| {
                Ok(codec.new_logout(user_ip, &self.secret, serial))
            })
            .await?;

        info!(user_ip = %user_ip, nas_ip = %nas_ip, "User logged out");
        Ok(ack)
    }

    /// Query the NAS for information about `user_ip`
    pub async fn req_info(&self, user_ip: Ipv4Addr, nas_ip: IpAddr) -> Result<Message, PortalError> {
        let codec = self.transport.codec();
        self.transport
            .request(self.nas_addr(nas_ip), &self.secret, |serial| {
                Ok(codec.new_req_info(user_ip, &self.secret, serial))
            })
            .await
    }

    /// Acknowledge a logout notification pushed by the NAS at `nas_ip`
    ///
    /// Notifications that fail the version 2 authenticator check, or carry
    /// no user IP, are not acknowledged.
    pub async fn notify_logout(&self, message: &Message, nas_ip: IpAddr) -> Result<(), PortalError> {
        if message.authenticator().is_some()
            && !verify_authenticator(message, &[0u8; 16], self.secret.as_bytes())
        {
            warn!(
                nas_ip = %nas_ip,
                serial_id = message.serial_id(),
                "Logout notification failed authenticator check"
            );
            return Ok(());
        }

        let Some(user_ip) = message.user_ip() else {
            warn!(nas_ip = %nas_ip, "Logout notification without user IP");
            return Ok(());
        };

        info!(user_ip = %user_ip, nas_ip = %nas_ip, "Logout notification received");

        let ack = self
            .transport
            .codec()
            .new_ack_ntf_logout(user_ip, &self.secret, message);
        self.transport.send_async(&ack, self.nas_addr(nas_ip)).await
    }
}

#[async_trait]
impl UnsolicitedHandler for PortalClient {
    async fn handle(&self, message: Message, source: IpAddr) {
        match message.message_type() {
            MessageType::NtfLogout => {
                if let Err(e) = self.notify_logout(&message, source).await {
                    warn!(
                        nas_ip = %source,
                        serial_id = message.serial_id(),
                        error = %e,
                        "Failed to acknowledge logout notification"
                    );
                }
            }
            other => {
                debug!(
                    nas_ip = %source,
                    message_type = ?other,
                    serial_id = message.serial_id(),
                    "Ignoring unsolicited message"
                );
            }
        }
    }
}
