//! Top-level pipeline orchestrator: recognition → cleaning → slimming →
//! pT assignment → track producer.

use super::{cleaning, pt_assign, recognition, slimming, track_producer, EventResult};
use crate::config::TrackBuildConfig;
use crate::context::TriggerContext;
use crate::error::EmtfResult;
use crate::hit::Hit;
use crate::model::PtModel;
use crate::road::roads_to_variables;
use track_producer::PtCalibration;

pub(crate) fn process_event(
    hits: &[Hit],
    ctx: &TriggerContext,
    config: &TrackBuildConfig,
    model: &dyn PtModel,
    calibration: &PtCalibration,
) -> EmtfResult<EventResult> {
    let roads = recognition::run(hits, ctx, &config.recognition)?;
    let clean_roads = cleaning::run(roads.clone(), &config.cleaning);
    let slim_roads = slimming::run(&clean_roads, ctx);

    let variables = roads_to_variables(&slim_roads);
    let assignment = pt_assign::run(&variables, model)?;
    let tracks = track_producer::run(
        &slim_roads,
        &assignment.encoded,
        &assignment.predictions,
        ctx.tables(),
        &config.trigger,
        calibration,
    )?;

    Ok(EventResult {
        roads,
        clean_roads,
        slim_roads,
        tracks,
        n_hits: hits.len(),
    })
}
