use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite, Transaction,
};
use tracing::debug;

use shared::{
    domain::{
        ActivityId, ActivityTypeId, EventId, InstitutionId, Modality, ResponsiblePartyId,
        TargetAudienceId, ThemeId, UniqueActivityId,
    },
    protocol::{
        Activity, ActivityPayload, ActivityType, Event, EventFields, Institution,
        ResponsibleParty, TargetAudience, Theme, UniqueActivity, UniqueActivityPayload,
    },
};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

/// Counts of reference rows present after [`Storage::seed_reference_defaults`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReferenceCounts {
    pub themes: usize,
    pub activity_types: usize,
    pub institutions: usize,
    pub target_audiences: usize,
    pub responsible_parties: usize,
}

const DEFAULT_THEMES: &[&str] = &[
    "Carreira em Tecnologia",
    "Desenvolvimento de Software",
    "Ciência de Dados",
    "Inteligência Artificial",
    "Segurança da Informação",
    "Empreendedorismo",
    "Diversidade e Inclusão",
];
const DEFAULT_ACTIVITY_TYPES: &[&str] = &["Palestra", "Workshop", "Mesa Redonda", "Mentoria", "Hackathon"];
const DEFAULT_INSTITUTIONS: &[&str] = &["Universidade Federal", "Comunidade Local", "Empresa Parceira"];
const DEFAULT_TARGET_AUDIENCES: &[&str] = &[
    "Estudantes",
    "Profissionais em transição de carreira",
    "Desenvolvedoras",
    "Público geral",
];
const DEFAULT_RESPONSIBLE_PARTIES: &[&str] = &["Coordenação do Evento", "Voluntárias da Comunidade"];

/// Restricts the child-row loaders to everything, one event, or one row.
#[derive(Debug, Clone, Copy)]
enum Scope {
    All,
    Event(i64),
    Row(i64),
}

impl Scope {
    fn clause(self, alias: &str) -> String {
        match self {
            Scope::All => String::new(),
            Scope::Event(_) => format!("WHERE {alias}.id_evento = ?"),
            Scope::Row(_) => format!("WHERE {alias}.id = ?"),
        }
    }

    fn value(self) -> Option<i64> {
        match self {
            Scope::All => None,
            Scope::Event(id) | Scope::Row(id) => Some(id),
        }
    }
}

const EVENT_COLUMNS: &str = "id, titulo, data_inicio, data_fim, descricao, valor, modalidade, link_inscricao, imagem_url, data_limite_inscricoes";

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        // every connection to `sqlite::memory:` opens its own empty database
        let max_connections = if database_url.starts_with("sqlite::memory:") {
            1
        } else {
            5
        };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    // ---- reference entities -------------------------------------------------

    pub async fn list_themes(&self) -> Result<Vec<Theme>> {
        let rows = sqlx::query("SELECT id, nome FROM temas ORDER BY lower(nome) ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| Theme {
                id: ThemeId(r.get::<i64, _>(0)),
                name: r.get::<String, _>(1),
            })
            .collect())
    }

    pub async fn list_activity_types(&self) -> Result<Vec<ActivityType>> {
        let rows = sqlx::query("SELECT id, nome FROM tipos ORDER BY lower(nome) ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| ActivityType {
                id: ActivityTypeId(r.get::<i64, _>(0)),
                name: r.get::<String, _>(1),
            })
            .collect())
    }

    pub async fn list_institutions(&self) -> Result<Vec<Institution>> {
        let rows = sqlx::query("SELECT id, nome FROM instituicoes ORDER BY lower(nome) ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| Institution {
                id: InstitutionId(r.get::<i64, _>(0)),
                name: r.get::<String, _>(1),
            })
            .collect())
    }

    pub async fn list_target_audiences(&self) -> Result<Vec<TargetAudience>> {
        let rows =
            sqlx::query("SELECT id, descricao FROM publicos_alvo ORDER BY lower(descricao) ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|r| TargetAudience {
                id: TargetAudienceId(r.get::<i64, _>(0)),
                description: r.get::<String, _>(1),
            })
            .collect())
    }

    pub async fn list_responsible_parties(&self) -> Result<Vec<ResponsibleParty>> {
        let rows = sqlx::query("SELECT id, nome FROM responsaveis ORDER BY lower(nome) ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| ResponsibleParty {
                id: ResponsiblePartyId(r.get::<i64, _>(0)),
                name: r.get::<String, _>(1),
            })
            .collect())
    }

    pub async fn create_theme(&self, name: &str) -> Result<ThemeId> {
        self.upsert_reference("temas", "nome", name)
            .await
            .map(ThemeId)
    }

    pub async fn create_activity_type(&self, name: &str) -> Result<ActivityTypeId> {
        self.upsert_reference("tipos", "nome", name)
            .await
            .map(ActivityTypeId)
    }

    pub async fn create_institution(&self, name: &str) -> Result<InstitutionId> {
        self.upsert_reference("instituicoes", "nome", name)
            .await
            .map(InstitutionId)
    }

    pub async fn create_target_audience(&self, description: &str) -> Result<TargetAudienceId> {
        self.upsert_reference("publicos_alvo", "descricao", description)
            .await
            .map(TargetAudienceId)
    }

    pub async fn create_responsible_party(&self, name: &str) -> Result<ResponsiblePartyId> {
        self.upsert_reference("responsaveis", "nome", name)
            .await
            .map(ResponsiblePartyId)
    }

    async fn upsert_reference(&self, table: &str, column: &str, value: &str) -> Result<i64> {
        let sql = format!(
            "INSERT INTO {table} ({column}) VALUES (?)
             ON CONFLICT({column}) DO UPDATE SET {column}=excluded.{column}
             RETURNING id"
        );
        let rec = sqlx::query(&sql)
            .bind(value.trim())
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("failed to insert '{value}' into {table}"))?;
        Ok(rec.get::<i64, _>(0))
    }

    /// Inserts the default reference collections. Existing rows are kept, so
    /// running it twice is harmless.
    pub async fn seed_reference_defaults(&self) -> Result<ReferenceCounts> {
        for name in DEFAULT_THEMES {
            self.create_theme(name).await?;
        }
        for name in DEFAULT_ACTIVITY_TYPES {
            self.create_activity_type(name).await?;
        }
        for name in DEFAULT_INSTITUTIONS {
            self.create_institution(name).await?;
        }
        for description in DEFAULT_TARGET_AUDIENCES {
            self.create_target_audience(description).await?;
        }
        for name in DEFAULT_RESPONSIBLE_PARTIES {
            self.create_responsible_party(name).await?;
        }
        self.reference_counts().await
    }

    pub async fn reference_counts(&self) -> Result<ReferenceCounts> {
        Ok(ReferenceCounts {
            themes: self.list_themes().await?.len(),
            activity_types: self.list_activity_types().await?.len(),
            institutions: self.list_institutions().await?.len(),
            target_audiences: self.list_target_audiences().await?.len(),
            responsible_parties: self.list_responsible_parties().await?.len(),
        })
    }

    // ---- events -------------------------------------------------------------

    pub async fn list_events(&self) -> Result<Vec<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM eventos ORDER BY data_inicio IS NULL, data_inicio ASC, id ASC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut activities: HashMap<i64, Vec<Activity>> = HashMap::new();
        for activity in self.load_activities(Scope::All).await? {
            if let Some(event_id) = activity.event_id {
                activities.entry(event_id.0).or_default().push(activity);
            }
        }
        let mut unique_activities: HashMap<i64, Vec<UniqueActivity>> = HashMap::new();
        for activity in self.load_unique_activities(Scope::All).await? {
            if let Some(event_id) = activity.event_id {
                unique_activities.entry(event_id.0).or_default().push(activity);
            }
        }

        Ok(rows
            .iter()
            .map(|row| {
                let mut event = event_from_row(row);
                event.activities = activities.remove(&event.id.0).unwrap_or_default();
                event.unique_activities = unique_activities.remove(&event.id.0).unwrap_or_default();
                event
            })
            .collect())
    }

    pub async fn load_event(&self, event_id: EventId) -> Result<Option<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM eventos WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(event_id.0)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut event = event_from_row(&row);
        event.activities = self.load_activities(Scope::Event(event_id.0)).await?;
        event.unique_activities = self.load_unique_activities(Scope::Event(event_id.0)).await?;
        Ok(Some(event))
    }

    pub async fn event_exists(&self, event_id: EventId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM eventos WHERE id = ?")
            .bind(event_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    pub async fn insert_event(&self, fields: &EventFields) -> Result<EventId> {
        let rec = sqlx::query(
            "INSERT INTO eventos (titulo, data_inicio, data_fim, descricao, valor, modalidade, link_inscricao, imagem_url, data_limite_inscricoes)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(fields.title.trim())
        .bind(fields.start_date)
        .bind(fields.end_date)
        .bind(fields.description.as_deref())
        .bind(fields.price.as_deref())
        .bind(fields.modality.map(Modality::as_str))
        .bind(fields.registration_link.as_deref())
        .bind(fields.image_url.as_deref())
        .bind(fields.registration_deadline)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert event")?;
        let event_id = EventId(rec.get::<i64, _>(0));
        debug!(%event_id, "event inserted");
        Ok(event_id)
    }

    /// Overwrites every bare field of the event. Returns false when the event
    /// does not exist.
    pub async fn update_event(&self, event_id: EventId, fields: &EventFields) -> Result<bool> {
        let updated = sqlx::query(
            "UPDATE eventos
             SET titulo = ?, data_inicio = ?, data_fim = ?, descricao = ?, valor = ?, modalidade = ?,
                 link_inscricao = ?, imagem_url = ?, data_limite_inscricoes = ?, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?",
        )
        .bind(fields.title.trim())
        .bind(fields.start_date)
        .bind(fields.end_date)
        .bind(fields.description.as_deref())
        .bind(fields.price.as_deref())
        .bind(fields.modality.map(Modality::as_str))
        .bind(fields.registration_link.as_deref())
        .bind(fields.image_url.as_deref())
        .bind(fields.registration_deadline)
        .bind(event_id.0)
        .execute(&self.pool)
        .await
        .context("failed to update event")?
        .rows_affected();
        Ok(updated > 0)
    }

    pub async fn delete_event(&self, event_id: EventId) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM eventos WHERE id = ?")
            .bind(event_id.0)
            .execute(&self.pool)
            .await
            .context("failed to delete event")?
            .rows_affected();
        Ok(deleted > 0)
    }

    // ---- activities ---------------------------------------------------------

    pub async fn list_activities(&self) -> Result<Vec<Activity>> {
        self.load_activities(Scope::All).await
    }

    pub async fn list_activities_for_event(&self, event_id: EventId) -> Result<Vec<Activity>> {
        self.load_activities(Scope::Event(event_id.0)).await
    }

    pub async fn load_activity(&self, activity_id: ActivityId) -> Result<Option<Activity>> {
        Ok(self
            .load_activities(Scope::Row(activity_id.0))
            .await?
            .into_iter()
            .next())
    }

    pub async fn insert_activity(
        &self,
        event_id: EventId,
        payload: &ActivityPayload,
    ) -> Result<ActivityId> {
        let mut tx = self.pool.begin().await?;
        let rec = sqlx::query(
            "INSERT INTO atividades (id_evento, nome, data, descricao, horario_inicio, horario_fim, detalhe_local, id_tipo, id_instituicao, id_publico_alvo, id_responsavel)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(event_id.0)
        .bind(payload.name.trim())
        .bind(payload.date)
        .bind(payload.description.as_deref())
        .bind(payload.start_time.as_deref())
        .bind(payload.end_time.as_deref())
        .bind(payload.location_detail.as_deref())
        .bind(payload.type_id.map(|id| id.0))
        .bind(payload.institution_id.map(|id| id.0))
        .bind(payload.audience_id.map(|id| id.0))
        .bind(payload.responsible_id.map(|id| id.0))
        .fetch_one(&mut *tx)
        .await?;
        let activity_id = rec.get::<i64, _>(0);

        replace_theme_links(&mut tx, ThemeLinks::ACTIVITY, activity_id, &payload.theme_ids).await?;
        tx.commit().await?;
        Ok(ActivityId(activity_id))
    }

    pub async fn update_activity(
        &self,
        activity_id: ActivityId,
        payload: &ActivityPayload,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query(
            "UPDATE atividades
             SET nome = ?, data = ?, descricao = ?, horario_inicio = ?, horario_fim = ?, detalhe_local = ?,
                 id_tipo = ?, id_instituicao = ?, id_publico_alvo = ?, id_responsavel = ?
             WHERE id = ?",
        )
        .bind(payload.name.trim())
        .bind(payload.date)
        .bind(payload.description.as_deref())
        .bind(payload.start_time.as_deref())
        .bind(payload.end_time.as_deref())
        .bind(payload.location_detail.as_deref())
        .bind(payload.type_id.map(|id| id.0))
        .bind(payload.institution_id.map(|id| id.0))
        .bind(payload.audience_id.map(|id| id.0))
        .bind(payload.responsible_id.map(|id| id.0))
        .bind(activity_id.0)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if updated == 0 {
            return Ok(false);
        }

        replace_theme_links(&mut tx, ThemeLinks::ACTIVITY, activity_id.0, &payload.theme_ids)
            .await?;
        tx.commit().await?;
        Ok(true)
    }

    pub async fn delete_activity(&self, activity_id: ActivityId) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM atividades WHERE id = ?")
            .bind(activity_id.0)
            .execute(&self.pool)
            .await
            .context("failed to delete activity")?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn load_activities(&self, scope: Scope) -> Result<Vec<Activity>> {
        let sql = format!(
            "SELECT a.id, a.id_evento, a.nome, a.data, a.descricao, a.horario_inicio, a.horario_fim, a.detalhe_local,
                    a.id_tipo, t.nome, a.id_instituicao, i.nome, a.id_publico_alvo, p.descricao, a.id_responsavel, r.nome
             FROM atividades a
             LEFT JOIN tipos t ON t.id = a.id_tipo
             LEFT JOIN instituicoes i ON i.id = a.id_instituicao
             LEFT JOIN publicos_alvo p ON p.id = a.id_publico_alvo
             LEFT JOIN responsaveis r ON r.id = a.id_responsavel
             {}
             ORDER BY a.data IS NULL, a.data ASC, a.horario_inicio ASC, a.id ASC",
            scope.clause("a")
        );
        let mut query = sqlx::query(&sql);
        if let Some(value) = scope.value() {
            query = query.bind(value);
        }
        let rows = query.fetch_all(&self.pool).await?;
        let mut themes = self.load_theme_links(ThemeLinks::ACTIVITY, scope).await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                let id = r.get::<i64, _>(0);
                Activity {
                    id: Some(ActivityId(id)),
                    event_id: Some(EventId(r.get::<i64, _>(1))),
                    name: r.get::<String, _>(2),
                    date: r.get::<Option<NaiveDate>, _>(3),
                    description: r.get::<Option<String>, _>(4),
                    start_time: r.get::<Option<String>, _>(5),
                    end_time: r.get::<Option<String>, _>(6),
                    location_detail: r.get::<Option<String>, _>(7),
                    type_id: r.get::<Option<i64>, _>(8).map(ActivityTypeId),
                    activity_type: joined(&r, 8, 9).map(|(id, name)| ActivityType {
                        id: ActivityTypeId(id),
                        name,
                    }),
                    institution_id: r.get::<Option<i64>, _>(10).map(InstitutionId),
                    institution: joined(&r, 10, 11).map(|(id, name)| Institution {
                        id: InstitutionId(id),
                        name,
                    }),
                    audience_id: r.get::<Option<i64>, _>(12).map(TargetAudienceId),
                    audience: joined(&r, 12, 13).map(|(id, description)| TargetAudience {
                        id: TargetAudienceId(id),
                        description,
                    }),
                    responsible_id: r.get::<Option<i64>, _>(14).map(ResponsiblePartyId),
                    responsible: joined(&r, 14, 15).map(|(id, name)| ResponsibleParty {
                        id: ResponsiblePartyId(id),
                        name,
                    }),
                    themes: themes.remove(&id).unwrap_or_default(),
                }
            })
            .collect())
    }

    // ---- unique activities --------------------------------------------------

    pub async fn list_unique_activities(&self) -> Result<Vec<UniqueActivity>> {
        self.load_unique_activities(Scope::All).await
    }

    pub async fn list_unique_activities_for_event(
        &self,
        event_id: EventId,
    ) -> Result<Vec<UniqueActivity>> {
        self.load_unique_activities(Scope::Event(event_id.0)).await
    }

    pub async fn load_unique_activity(
        &self,
        unique_activity_id: UniqueActivityId,
    ) -> Result<Option<UniqueActivity>> {
        Ok(self
            .load_unique_activities(Scope::Row(unique_activity_id.0))
            .await?
            .into_iter()
            .next())
    }

    pub async fn insert_unique_activity(
        &self,
        event_id: EventId,
        payload: &UniqueActivityPayload,
    ) -> Result<UniqueActivityId> {
        let mut tx = self.pool.begin().await?;
        let rec = sqlx::query(
            "INSERT INTO atividades_unicas (id_evento, horario_inicio, horario_fim, detalhe_local, id_instituicao, id_publico_alvo, id_responsavel)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(event_id.0)
        .bind(payload.start_time.as_deref())
        .bind(payload.end_time.as_deref())
        .bind(payload.location_detail.as_deref())
        .bind(payload.institution_id.map(|id| id.0))
        .bind(payload.audience_id.map(|id| id.0))
        .bind(payload.responsible_id.map(|id| id.0))
        .fetch_one(&mut *tx)
        .await?;
        let unique_activity_id = rec.get::<i64, _>(0);

        replace_theme_links(
            &mut tx,
            ThemeLinks::UNIQUE_ACTIVITY,
            unique_activity_id,
            &payload.theme_ids,
        )
        .await?;
        tx.commit().await?;
        Ok(UniqueActivityId(unique_activity_id))
    }

    pub async fn update_unique_activity(
        &self,
        unique_activity_id: UniqueActivityId,
        payload: &UniqueActivityPayload,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query(
            "UPDATE atividades_unicas
             SET horario_inicio = ?, horario_fim = ?, detalhe_local = ?,
                 id_instituicao = ?, id_publico_alvo = ?, id_responsavel = ?
             WHERE id = ?",
        )
        .bind(payload.start_time.as_deref())
        .bind(payload.end_time.as_deref())
        .bind(payload.location_detail.as_deref())
        .bind(payload.institution_id.map(|id| id.0))
        .bind(payload.audience_id.map(|id| id.0))
        .bind(payload.responsible_id.map(|id| id.0))
        .bind(unique_activity_id.0)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if updated == 0 {
            return Ok(false);
        }

        replace_theme_links(
            &mut tx,
            ThemeLinks::UNIQUE_ACTIVITY,
            unique_activity_id.0,
            &payload.theme_ids,
        )
        .await?;
        tx.commit().await?;
        Ok(true)
    }

    pub async fn delete_unique_activity(&self, unique_activity_id: UniqueActivityId) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM atividades_unicas WHERE id = ?")
            .bind(unique_activity_id.0)
            .execute(&self.pool)
            .await
            .context("failed to delete unique activity")?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn load_unique_activities(&self, scope: Scope) -> Result<Vec<UniqueActivity>> {
        let sql = format!(
            "SELECT a.id, a.id_evento, a.horario_inicio, a.horario_fim, a.detalhe_local,
                    a.id_instituicao, i.nome, a.id_publico_alvo, p.descricao, a.id_responsavel, r.nome
             FROM atividades_unicas a
             LEFT JOIN instituicoes i ON i.id = a.id_instituicao
             LEFT JOIN publicos_alvo p ON p.id = a.id_publico_alvo
             LEFT JOIN responsaveis r ON r.id = a.id_responsavel
             {}
             ORDER BY a.id ASC",
            scope.clause("a")
        );
        let mut query = sqlx::query(&sql);
        if let Some(value) = scope.value() {
            query = query.bind(value);
        }
        let rows = query.fetch_all(&self.pool).await?;
        let mut themes = self
            .load_theme_links(ThemeLinks::UNIQUE_ACTIVITY, scope)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                let id = r.get::<i64, _>(0);
                UniqueActivity {
                    id: Some(UniqueActivityId(id)),
                    event_id: Some(EventId(r.get::<i64, _>(1))),
                    start_time: r.get::<Option<String>, _>(2),
                    end_time: r.get::<Option<String>, _>(3),
                    location_detail: r.get::<Option<String>, _>(4),
                    institution_id: r.get::<Option<i64>, _>(5).map(InstitutionId),
                    institution: joined(&r, 5, 6).map(|(id, name)| Institution {
                        id: InstitutionId(id),
                        name,
                    }),
                    audience_id: r.get::<Option<i64>, _>(7).map(TargetAudienceId),
                    audience: joined(&r, 7, 8).map(|(id, description)| TargetAudience {
                        id: TargetAudienceId(id),
                        description,
                    }),
                    responsible_id: r.get::<Option<i64>, _>(9).map(ResponsiblePartyId),
                    responsible: joined(&r, 9, 10).map(|(id, name)| ResponsibleParty {
                        id: ResponsiblePartyId(id),
                        name,
                    }),
                    themes: themes.remove(&id).unwrap_or_default(),
                }
            })
            .collect())
    }

    async fn load_theme_links(
        &self,
        links: ThemeLinks,
        scope: Scope,
    ) -> Result<HashMap<i64, Vec<Theme>>> {
        let sql = format!(
            "SELECT l.{owner}, tm.id, tm.nome
             FROM {table} l
             INNER JOIN {parent} a ON a.id = l.{owner}
             INNER JOIN temas tm ON tm.id = l.id_tema
             {clause}
             ORDER BY lower(tm.nome) ASC",
            owner = links.owner_column,
            table = links.table,
            parent = links.parent_table,
            clause = scope.clause("a"),
        );
        let mut query = sqlx::query(&sql);
        if let Some(value) = scope.value() {
            query = query.bind(value);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut themes: HashMap<i64, Vec<Theme>> = HashMap::new();
        for r in rows {
            themes.entry(r.get::<i64, _>(0)).or_default().push(Theme {
                id: ThemeId(r.get::<i64, _>(1)),
                name: r.get::<String, _>(2),
            });
        }
        Ok(themes)
    }
}

/// Join table holding the theme set of one child kind.
#[derive(Debug, Clone, Copy)]
struct ThemeLinks {
    table: &'static str,
    owner_column: &'static str,
    parent_table: &'static str,
}

impl ThemeLinks {
    const ACTIVITY: ThemeLinks = ThemeLinks {
        table: "atividade_temas",
        owner_column: "id_atividade",
        parent_table: "atividades",
    };
    const UNIQUE_ACTIVITY: ThemeLinks = ThemeLinks {
        table: "atividade_unica_temas",
        owner_column: "id_atividade_unica",
        parent_table: "atividades_unicas",
    };
}

async fn replace_theme_links(
    tx: &mut Transaction<'_, Sqlite>,
    links: ThemeLinks,
    owner: i64,
    theme_ids: &[ThemeId],
) -> Result<()> {
    let delete = format!("DELETE FROM {} WHERE {} = ?", links.table, links.owner_column);
    sqlx::query(&delete).bind(owner).execute(&mut **tx).await?;

    let insert = format!(
        "INSERT OR IGNORE INTO {} ({}, id_tema) VALUES (?, ?)",
        links.table, links.owner_column
    );
    for theme_id in theme_ids {
        sqlx::query(&insert)
            .bind(owner)
            .bind(theme_id.0)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

fn event_from_row(r: &SqliteRow) -> Event {
    Event {
        id: EventId(r.get::<i64, _>(0)),
        fields: EventFields {
            title: r.get::<String, _>(1),
            start_date: r.get::<Option<NaiveDate>, _>(2),
            end_date: r.get::<Option<NaiveDate>, _>(3),
            description: r.get::<Option<String>, _>(4),
            price: r.get::<Option<String>, _>(5),
            modality: r
                .get::<Option<String>, _>(6)
                .and_then(|raw| raw.parse::<Modality>().ok()),
            registration_link: r.get::<Option<String>, _>(7),
            image_url: r.get::<Option<String>, _>(8),
            registration_deadline: r.get::<Option<NaiveDate>, _>(9),
        },
        activities: Vec::new(),
        unique_activities: Vec::new(),
    }
}

/// Reads a LEFT JOINed `(id, label)` pair; `None` when the foreign key is
/// unset or points at nothing.
fn joined(r: &SqliteRow, id_idx: usize, label_idx: usize) -> Option<(i64, String)> {
    let id = r.get::<Option<i64>, _>(id_idx)?;
    let label = r.get::<Option<String>, _>(label_idx)?;
    Some((id, label))
}

/// True when the error chain carries a SQLite foreign-key violation, i.e. the
/// caller referenced a row that does not exist.
pub fn is_reference_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<sqlx::Error>()
            .and_then(sqlx::Error::as_database_error)
            .is_some_and(|db| db.is_foreign_key_violation())
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
