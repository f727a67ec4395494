//! Online pipeline: remote vision scoring
//!
//! Species when the top result is a species with combined score above 85.
//! Otherwise the common ancestor, rolled up to the nearest primary rank
//! when its own rank is not display-worthy. Otherwise empty.

use super::{PathOutcome, ResolutionContext, ResolutionOrchestrator};
use crate::error::ResolveError;
use crate::models::{
    CapturedImage, IdentificationEvent, ObservationRecord, ResolutionState, ResolvedTaxon,
    TaxonRecord,
};
use crate::services::classifier::COMBINED_SCORE_THRESHOLD;
use crate::services::location::LocationAttachment;
use crate::services::vision_client::{UploadPayload, VisionError, VisionResponse};
use crate::taxonomy::{is_primary_rank, nearest_primary_ancestor, resolve_iconic_group, RankedTaxon};
use chrono::{DateTime, Utc};

/// Map a scorer failure onto the user-visible error taxonomy
///
/// A 503 with a parseable `retry-after` becomes `ServiceDowntime`; any other
/// failure to get a usable response is `OnlineVisionUnavailable`.
pub fn classify_vision_error(error: &VisionError, now: DateTime<Utc>) -> ResolveError {
    match error {
        VisionError::Status {
            status: 503,
            retry_after: Some(retry_after),
        } => match fieldguide_common::time::hours_until(retry_after, now) {
            Some(hours) => ResolveError::ServiceDowntime { hours },
            None => {
                tracing::warn!(retry_after = %retry_after, "Unparseable retry-after on 503");
                ResolveError::OnlineVisionUnavailable(error.to_string())
            }
        },
        VisionError::Image(msg) => ResolveError::PermissionDenied(msg.clone()),
        other => ResolveError::OnlineVisionUnavailable(other.to_string()),
    }
}

/// What the scoring response points at
#[derive(Debug, Clone, PartialEq)]
pub enum OnlineMatch {
    Species { taxon: TaxonRecord },
    Ancestor { taxon: TaxonRecord },
    NoMatch,
}

/// Decide species / ancestor / nothing from a scoring response
pub fn select_online_match(response: &VisionResponse) -> OnlineMatch {
    let Some(top) = response.results.first() else {
        return OnlineMatch::NoMatch;
    };

    if top.combined_score > COMBINED_SCORE_THRESHOLD && top.taxon.is_species() {
        return OnlineMatch::Species {
            taxon: top.taxon.clone(),
        };
    }

    let Some(common_ancestor) = &response.common_ancestor else {
        return OnlineMatch::NoMatch;
    };

    let rank_level = common_ancestor.taxon.rank_level();
    if is_primary_rank(rank_level) {
        return OnlineMatch::Ancestor {
            taxon: common_ancestor.taxon.clone(),
        };
    }

    match nearest_primary_ancestor(&top.taxon.ancestors, rank_level) {
        Some(rolled_up) => OnlineMatch::Ancestor {
            taxon: rolled_up.clone(),
        },
        None => {
            tracing::debug!(
                ancestor_id = common_ancestor.taxon.id,
                rank_level,
                "Common ancestor has no primary-rank roll-up"
            );
            OnlineMatch::NoMatch
        }
    }
}

impl ResolutionOrchestrator {
    pub(super) async fn resolve_online(
        &self,
        ctx: &mut ResolutionContext,
        event: &IdentificationEvent,
    ) -> Result<PathOutcome, ResolveError> {
        let backend = self.vision.as_ref().ok_or_else(|| {
            ResolveError::OnlineVisionUnavailable("Vision service not configured".to_string())
        })?;

        // The upload carries the coordinates
        let located = ctx
            .run_cancellable(
                self.location
                    .attach_location(event.image.clone(), event.location_permission),
            )
            .await?;

        let token = backend.auth.token().map_err(|e| {
            tracing::error!(error = %e, "Failed to sign vision token");
            ResolveError::OnlineVisionUnavailable(format!("Token signing failed: {}", e))
        })?;
        let payload = UploadPayload::from_image(&located.image);

        let scored = ctx
            .run_cancellable(tokio::time::timeout(
                self.vision_timeout,
                backend.scorer.score_image(&payload, &token),
            ))
            .await?;

        let response = match scored {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                let error = classify_vision_error(&e, fieldguide_common::time::now());
                tracing::warn!(event_id = %ctx.event_id(), error = %e, code = error.code(), "Vision scoring failed");
                return Err(error);
            }
            Err(_) => {
                // VisionClient itself has no timeout
                tracing::warn!(
                    event_id = %ctx.event_id(),
                    timeout_secs = self.vision_timeout.as_secs(),
                    "Vision scoring timed out"
                );
                return Err(ResolveError::OnlineVisionUnavailable(
                    "Vision service timed out".to_string(),
                ));
            }
        };

        ctx.ensure_live()?;

        match select_online_match(&response) {
            OnlineMatch::Species { taxon } => {
                ctx.transition_to(ResolutionState::SpeciesPath);
                self.online_species(ctx, taxon, located).await
            }
            OnlineMatch::Ancestor { taxon } => {
                ctx.transition_to(ResolutionState::AncestorPath);
                ctx.transition_to(ResolutionState::Enriching);
                Ok(PathOutcome {
                    taxon: online_ancestor(&taxon),
                    image: located.image,
                    location_error: None,
                    location_error_code: located.error_code,
                    first_sighting: false,
                })
            }
            OnlineMatch::NoMatch => {
                ctx.transition_to(ResolutionState::NoMatchPath);
                Ok(PathOutcome::empty(located.image, located.error_code))
            }
        }
    }

    async fn online_species(
        &self,
        ctx: &mut ResolutionContext,
        taxon: TaxonRecord,
        located: LocationAttachment,
    ) -> Result<PathOutcome, ResolveError> {
        ctx.transition_to(ResolutionState::Enriching);

        let seen_date = ctx.run_cancellable(self.lookup_seen_date(taxon.id)).await?;
        let photo_url = taxon.photo_url();

        let mut first_sighting = false;
        let mut location_error = None;

        if seen_date.is_none() {
            let observation = online_observation(&taxon, photo_url.clone(), &located.image);
            (first_sighting, location_error) = self
                .record_sighting(ctx, &observation, &located.image, located.error_code)
                .await?;
        }

        Ok(PathOutcome {
            taxon: ResolvedTaxon::Species {
                taxon_id: taxon.id,
                scientific_name: taxon.name,
                photo_url,
                seen_date,
            },
            image: located.image,
            location_error,
            location_error_code: located.error_code,
            first_sighting,
        })
    }
}

fn online_ancestor(taxon: &TaxonRecord) -> ResolvedTaxon {
    ResolvedTaxon::Ancestor {
        taxon_id: taxon.id,
        scientific_name: taxon.name.clone(),
        // Primary ranks are whole numbers
        rank: taxon.rank_level() as i32,
        photo_url: taxon.photo_url(),
    }
}

fn online_observation(
    taxon: &TaxonRecord,
    photo_url: Option<String>,
    image: &CapturedImage,
) -> ObservationRecord {
    let iconic_group = taxon
        .iconic_taxon_id
        .unwrap_or_else(|| resolve_iconic_group(&taxon.ancestor_ids));

    ObservationRecord::new(
        taxon.id,
        taxon.name.clone(),
        iconic_group,
        taxon.ancestor_ids.clone(),
        photo_url,
        image,
    )
}
