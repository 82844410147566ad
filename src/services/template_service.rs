// src/services/template_service.rs

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, PageRequest},
    },
    db::{Query, Sort, TemplateRepository},
    models::{
        auth::{SubscriptionPlan, User},
        design::Design,
        furniture::RatingAggregate,
        template::{Template, UseTemplatePayload},
    },
    services::{
        access_policy::authorize_template,
        catalog::{self, CatalogPage, TemplateFacets, TemplateQuery},
        design_service::DesignService,
    },
};

fn plan_of(user: Option<&User>) -> SubscriptionPlan {
    user.map(|u| u.subscription_plan).unwrap_or_default()
}

#[derive(Clone)]
pub struct TemplateService {
    templates: TemplateRepository,
    designs: DesignService,
}

impl TemplateService {
    pub fn new(templates: TemplateRepository, designs: DesignService) -> Self {
        Self { templates, designs }
    }

    async fn load(&self, id: Uuid, user: Option<&User>) -> Result<Template, AppError> {
        let template = self
            .templates
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Template".into()))?;
        authorize_template(&template, user)?;
        Ok(template)
    }

    pub async fn list_page(&self, user: Option<&User>, query: &TemplateQuery) -> Result<Page<Template>, AppError> {
        let q = query.to_query(plan_of(user))?;
        self.templates.find_page(q, query.page_request()).await
    }

    /// Listagem filtrada pelo plano + facets do catálogo ativo.
    pub async fn list(
        &self,
        user: Option<&User>,
        query: &TemplateQuery,
    ) -> Result<CatalogPage<Template, TemplateFacets>, AppError> {
        let page = self.list_page(user, query).await?;
        let facets = catalog::template_facets(self.templates.collection()).await?;
        Ok(CatalogPage { page, facets })
    }

    pub async fn featured(&self, user: Option<&User>, limit: u64) -> Result<Vec<Template>, AppError> {
        let query = TemplateQuery {
            featured: Some(true),
            ..Default::default()
        };
        let q = Query::new(query.filter(plan_of(user)))
            .sort(Sort::desc("rating.average"))
            .sort(Sort::desc("usageCount"))
            .limit(limit);
        self.templates.find(&q).await
    }

    pub async fn search(
        &self,
        user: Option<&User>,
        term: &str,
        page: PageRequest,
    ) -> Result<Page<Template>, AppError> {
        let query = TemplateQuery {
            search: Some(term.to_string()),
            ..Default::default()
        };
        self.templates.find_page(query.to_query(plan_of(user))?, page).await
    }

    /// Leitura de um template. Conta como uso (o `/use` conta de novo).
    pub async fn get(&self, id: Uuid, user: Option<&User>) -> Result<Template, AppError> {
        let mut template = self.load(id, user).await?;
        if self.templates.increment_usage(id).await? {
            template.usage_count += 1;
        }
        Ok(template)
    }

    /// Materializa um design (cópia, sem vínculo) num projeto do usuário.
    pub async fn use_template(
        &self,
        id: Uuid,
        user: &User,
        payload: UseTemplatePayload,
    ) -> Result<Design, AppError> {
        let template = self.load(id, Some(user)).await?;
        let design = template.to_design(payload.project_id, user.id, payload.name, Utc::now());
        let design = self.designs.create_in_project(user, design).await?;

        // Fora de transação com a criação do design
        self.templates.increment_usage(id).await?;
        tracing::info!(template_id = %id, design_id = %design.id, "Template usado");
        Ok(design)
    }

    pub async fn rate(&self, id: Uuid, user: &User, rating: u8) -> Result<RatingAggregate, AppError> {
        let mut template = self.load(id, Some(user)).await?;
        template.rating.add(rating);
        self.templates.save(&mut template).await?;
        Ok(template.rating)
    }
}
