// SPDX-License-Identifier: AGPL-3.0-only

//! Stream bracket: switch the FRL link between GAP-only training traffic and
//! the full audio/video stream.

use super::observer::TrainingObserver;
use super::state::{StreamState, StreamStatus};
use crate::registers::RegisterAccess;
use crate::tx::{FrlActiveMode, TxCore};
use tracing::info;

pub(crate) fn start<R, O>(core: &mut TxCore<R>, stream: &mut StreamStatus, observer: &mut O)
where
    R: RegisterAccess,
    O: TrainingObserver + ?Sized,
{
    if stream.is_hdmi {
        core.aux_enable();
    }
    core.aux_intr_enable();
    core.set_frl_active(FrlActiveMode::FullStream);
    stream.state = StreamState::Up;
    core.dynhdr_dm_enable();
    info!("FRL stream up");
    observer.stream_up();
}

pub(crate) fn stop<R, O>(core: &mut TxCore<R>, stream: &mut StreamStatus, observer: &mut O)
where
    R: RegisterAccess,
    O: TrainingObserver + ?Sized,
{
    core.aux_disable();
    core.aux_intr_disable();
    stream.state = StreamState::Down;
    core.dynhdr_dm_disable();
    info!("FRL stream down");
    observer.stream_down();
}
