use std::rc::Rc;

use async_trait::async_trait;
use gloo_net::http::{Method, Request};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use yew::prelude::*;

use console_core::api::{
    paths, CatalogBackend, DutyBackend, Envelope, InchargeBackend, Lenient, MasterBackend, Outcome, ReportBackend,
    WriteAck, WriteMethod,
};
use console_core::config::ConsoleConfig;
use console_core::error::{AuthError, ConsoleError, Result};
use console_core::ids::{DutyId, InchargeId, ItsId, JamiaatId, MiqaatId, TeamId, VenueId};
use console_core::model::{Duty, DutyDraft, Incharge, InchargeDraft, Jamiaat, Location, Member, Miqaat, Team};
use console_core::reports::{AttendanceDetail, AttendanceRow, DutyReportRow};
use console_core::session::{LoginGrant, Session};

use crate::session::{sign_out, use_session, SessionHandle};

/* ---------------- wire shapes ---------------- */

#[derive(Serialize)]
struct LoginBody<'a> {
    its_id: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct RemainingQuota {
    remaining_quota: i64,
}

#[derive(Deserialize)]
struct MemberCount {
    member_count: u32,
}

fn transport(err: gloo_net::Error) -> ConsoleError {
    ConsoleError::Transport(err.to_string())
}

/* ---------------- HTTP backend ---------------- */

/// REST client over `fetch`, one per session.
#[derive(Clone, PartialEq)]
pub struct HttpBackend {
    base: String,
    bearer: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &ConsoleConfig, session: Option<&Session>) -> Self {
        Self { base: config.api_base.clone(), bearer: session.map(Session::bearer) }
    }

    async fn send<T, U>(&self, method: Method, path: &str, body: Option<&T>) -> Result<U>
    where
        T: Serialize + ?Sized,
        U: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base);
        let builder = match method {
            Method::POST => Request::post(&url),
            Method::PUT => Request::put(&url),
            Method::DELETE => Request::delete(&url),
            _ => Request::get(&url),
        };
        let builder = match &self.bearer {
            Some(b) => builder.header("Authorization", b),
            None => builder,
        };

        let resp = match body {
            Some(b) => builder.json(b).map_err(transport)?.send().await,
            None => builder.send().await,
        }
        .map_err(transport)?;

        match resp.status() {
            401 => {
                log::warn!("{method} {path}: token rejected");
                return Err(AuthError::Rejected.into());
            }
            403 => {
                return Err(ConsoleError::Rejected {
                    code: 403,
                    message: "You do not have access to this resource".to_string(),
                })
            }
            _ => {}
        }

        // Business rejections (duplicates and the like) still carry an envelope.
        let status = resp.status();
        let text = resp.text().await.map_err(transport)?;
        serde_json::from_str(&text).map_err(|err| {
            if (200..300).contains(&status) {
                log::error!("{method} {path}: undecodable body: {err}");
                ConsoleError::Decode(err.to_string())
            } else {
                ConsoleError::Rejected { code: i64::from(status), message: format!("HTTP {status}") }
            }
        })
    }

    async fn read<U: DeserializeOwned>(&self, path: &str) -> Result<U> {
        self.send::<(), Envelope<U>>(Method::GET, path, None).await?.into_data()
    }

    async fn write<T: Serialize + ?Sized>(&self, method: Method, path: &str, body: Option<&T>) -> Result<Outcome> {
        let env: Envelope<WriteAck> = self.send(method.clone(), path, body).await?;
        let outcome = Outcome::from_envelope(&env);
        log::debug!("{method} {path} -> {outcome:?}");
        Ok(outcome)
    }

    pub async fn login(&self, its_id: &ItsId, password: &str) -> Result<LoginGrant> {
        let body = LoginBody { its_id: its_id.as_str(), password };
        let env: Envelope<LoginGrant> = self.send(Method::POST, paths::LOGIN, Some(&body)).await?;
        env.into_data()
    }
}

#[async_trait(?Send)]
impl CatalogBackend for HttpBackend {
    async fn miqaats(&self) -> Result<Vec<Miqaat>> {
        self.read(paths::MIQAATS).await
    }

    async fn jamiaats(&self) -> Result<Vec<Jamiaat>> {
        self.read(paths::JAMIAATS).await
    }

    async fn teams(&self, jamiaat: Option<JamiaatId>) -> Result<Vec<Team>> {
        match jamiaat {
            Some(id) => self.read(&paths::teams_by_jamiaat(id)).await,
            None => self.read(paths::TEAMS).await,
        }
    }

    async fn locations(&self, venue: VenueId) -> Result<Vec<Location>> {
        self.read(&paths::locations_by_venue(venue)).await
    }

    async fn remaining_quota(&self, miqaat: MiqaatId) -> Result<i64> {
        let r: RemainingQuota = self.read(&paths::remaining_quota(miqaat)).await?;
        Ok(r.remaining_quota)
    }

    async fn duties(&self, miqaat: MiqaatId) -> Result<Vec<Duty>> {
        self.read(&paths::duties_by_miqaat(miqaat)).await
    }

    async fn team_member_count(&self, team: TeamId) -> Result<u32> {
        let r: MemberCount = self.read(&paths::team_member_count(team)).await?;
        Ok(r.member_count)
    }

    async fn team_members(&self, team: TeamId) -> Result<Vec<Member>> {
        let Lenient(rows) = self.read(&paths::team_members(team)).await?;
        Ok(rows)
    }
}

#[async_trait(?Send)]
impl DutyBackend for HttpBackend {
    async fn create_duty(&self, draft: &DutyDraft) -> Result<Outcome> {
        self.write(Method::POST, paths::DUTIES, Some(draft)).await
    }

    async fn update_duty(&self, id: DutyId, draft: &DutyDraft) -> Result<Outcome> {
        self.write(Method::PUT, &paths::duty(id), Some(draft)).await
    }

    async fn delete_duty(&self, id: DutyId) -> Result<Outcome> {
        self.write::<()>(Method::DELETE, &paths::duty(id), None).await
    }
}

#[async_trait(?Send)]
impl InchargeBackend for HttpBackend {
    async fn incharges(&self, miqaat: MiqaatId) -> Result<Vec<Incharge>> {
        let Lenient(rows) = self.read(&paths::incharges_by_miqaat(miqaat)).await?;
        Ok(rows)
    }

    async fn create_incharge(&self, draft: &InchargeDraft) -> Result<Outcome> {
        self.write(Method::POST, paths::INCHARGES, Some(draft)).await
    }

    async fn delete_incharge(&self, id: InchargeId) -> Result<Outcome> {
        self.write::<()>(Method::DELETE, &paths::incharge(id), None).await
    }
}

#[async_trait(?Send)]
impl ReportBackend for HttpBackend {
    async fn duty_report(&self, miqaat: MiqaatId) -> Result<Vec<DutyReportRow>> {
        self.read(&paths::duty_report(miqaat)).await
    }

    async fn attendance_report(&self, miqaat: MiqaatId) -> Result<Vec<AttendanceRow>> {
        self.read(&paths::attendance_report(miqaat)).await
    }

    async fn attendance_detail(&self, miqaat: MiqaatId, team: TeamId) -> Result<Vec<AttendanceDetail>> {
        self.read(&paths::attendance_detail(miqaat, team)).await
    }
}

#[async_trait(?Send)]
impl MasterBackend for HttpBackend {
    async fn list_raw(&self, path: &str) -> Result<Value> {
        self.read(path).await
    }

    async fn write_raw(&self, method: WriteMethod, path: &str, body: Option<Value>) -> Result<Outcome> {
        let method = match method {
            WriteMethod::Post => Method::POST,
            WriteMethod::Put => Method::PUT,
            WriteMethod::Delete => Method::DELETE,
        };
        self.write(method, path, body.as_ref()).await
    }
}

/* ---------------- hooks & error routing ---------------- */

#[hook]
pub fn use_backend() -> Rc<HttpBackend> {
    let session = use_session();
    use_memo((*session).clone(), |s| HttpBackend::new(&crate::config::load(), s.as_ref()))
}

/// Auth failures end the session (the guard then sends the user to the
/// login page); anything else comes back as alert text.
pub fn surface(err: ConsoleError, session: &SessionHandle) -> Option<String> {
    if err.requires_logout() {
        log::warn!("ending session: {err}");
        sign_out(session);
        return None;
    }
    log::error!("{err}");
    Some(err.user_message())
}
