//! Offline pipeline: on-device predictions

use super::{PathOutcome, ResolutionContext, ResolutionOrchestrator};
use crate::error::ResolveError;
use crate::models::{
    IdentificationEvent, ObservationRecord, Prediction, PredictionSet, ResolutionState,
    ResolvedTaxon,
};
use crate::services::classifier::{classify, Classification, PREDICTION_THRESHOLD};
use crate::taxonomy::resolve_iconic_group;

impl ResolutionOrchestrator {
    pub(super) async fn resolve_offline(
        &self,
        ctx: &mut ResolutionContext,
        event: &IdentificationEvent,
    ) -> Result<PathOutcome, ResolveError> {
        let predictions = event.image.prediction_set();

        match classify(&predictions, PREDICTION_THRESHOLD) {
            Classification::Species(species) => {
                ctx.transition_to(ResolutionState::SpeciesPath);
                self.offline_species(ctx, event, &predictions, species).await
            }
            Classification::Ancestor(ancestor) => {
                ctx.transition_to(ResolutionState::AncestorPath);
                self.offline_ancestor(ctx, event, ancestor).await
            }
            Classification::NoMatch => {
                tracing::debug!(
                    event_id = %ctx.event_id(),
                    predictions = predictions.len(),
                    "No prediction above threshold"
                );
                ctx.transition_to(ResolutionState::NoMatchPath);
                Ok(PathOutcome::empty(
                    event.image.clone(),
                    event.image.error_code,
                ))
            }
        }
    }

    async fn offline_species(
        &self,
        ctx: &mut ResolutionContext,
        event: &IdentificationEvent,
        predictions: &PredictionSet,
        species: Prediction,
    ) -> Result<PathOutcome, ResolveError> {
        let ancestor_ids = if self.attach_offline_ancestor_ids {
            predictions.lineage_ids()
        } else {
            species.ancestor_ids.clone()
        };

        ctx.ensure_live()?;
        ctx.transition_to(ResolutionState::Enriching);

        let taxon_id = species.taxon_id;
        let (seen_date, photo_url, located) = ctx
            .run_cancellable(async {
                tokio::join!(
                    self.lookup_seen_date(taxon_id),
                    self.photos.fetch_photo(taxon_id),
                    self.location
                        .attach_location(event.image.clone(), event.location_permission),
                )
            })
            .await?;

        let mut first_sighting = false;
        let mut location_error = None;

        if seen_date.is_none() {
            let iconic_group = resolve_iconic_group(&ancestor_ids);
            let observation = ObservationRecord::new(
                taxon_id,
                species.name.clone(),
                iconic_group,
                ancestor_ids,
                photo_url.clone(),
                &located.image,
            );
            (first_sighting, location_error) = self
                .record_sighting(ctx, &observation, &located.image, located.error_code)
                .await?;
        }

        Ok(PathOutcome {
            taxon: ResolvedTaxon::Species {
                taxon_id,
                scientific_name: species.name,
                photo_url,
                seen_date,
            },
            image: located.image,
            location_error,
            location_error_code: located.error_code,
            first_sighting,
        })
    }

    async fn offline_ancestor(
        &self,
        ctx: &mut ResolutionContext,
        event: &IdentificationEvent,
        ancestor: Prediction,
    ) -> Result<PathOutcome, ResolveError> {
        ctx.ensure_live()?;
        ctx.transition_to(ResolutionState::Enriching);

        let (photo_url, located) = ctx
            .run_cancellable(async {
                tokio::join!(
                    self.photos.fetch_photo(ancestor.taxon_id),
                    self.location
                        .attach_location(event.image.clone(), event.location_permission),
                )
            })
            .await?;

        Ok(PathOutcome {
            taxon: ResolvedTaxon::Ancestor {
                taxon_id: ancestor.taxon_id,
                scientific_name: ancestor.name,
                rank: ancestor.rank,
                photo_url,
            },
            image: located.image,
            location_error: None,
            location_error_code: located.error_code,
            first_sighting: false,
        })
    }
}
