// src/domain/cancellation_flow.rs

//! 解約ウィザードのステップ管理
//!
//! 画面ごとにステップ番号を持たせず、1つの状態値だけで
//! intro → survey → reason → offer → visa-support → completion を進める。

use super::cancellation_model::DownsellVariant;
use crate::api::dto::cancellation_dto::SubmitCancellationDto;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 「プラットフォームが役に立たなかった」の自由記述に必要な最小文字数
pub const MIN_FEEDBACK_CHARS: usize = 25;
/// ビザ種別の最小文字数
pub const MIN_VISA_TYPE_CHARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationStep {
    Intro,
    Survey,
    Reason,
    Offer,
    VisaSupport,
    Completion,
}

impl fmt::Display for CancellationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CancellationStep::Intro => "intro",
            CancellationStep::Survey => "survey",
            CancellationStep::Reason => "reason",
            CancellationStep::Offer => "offer",
            CancellationStep::VisaSupport => "visa_support",
            CancellationStep::Completion => "completion",
        };
        f.write_str(name)
    }
}

/// intro で選ばれる分岐
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowPath {
    FoundJob,
    StillLooking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowOutcome {
    /// ダウンセルを受け入れて解約しなかった
    DownsellAccepted,
    /// 解約を確定した
    Cancelled,
}

/// 求職状況アンケート（応募数・メール数・面接数のレンジ）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSearchSurvey {
    pub applied: String,
    pub emailed: String,
    pub interviewed: String,
}

impl JobSearchSurvey {
    fn is_complete(&self) -> bool {
        [&self.applied, &self.emailed, &self.interviewed]
            .iter()
            .all(|answer| !answer.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisaSupportAnswer {
    pub company_provides_lawyer: bool,
    pub visa_type: String,
}

/// 解約理由
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CancellationReason {
    TooExpensive { max_price: String },
    PlatformNotHelpful { feedback: String },
    NotEnoughRelevantJobs,
    DecidedNotToMove,
    Other,
}

impl CancellationReason {
    pub fn validate(&self) -> Result<(), FlowError> {
        match self {
            CancellationReason::TooExpensive { max_price } if max_price.trim().is_empty() => Err(
                FlowError::InvalidReason("max price is required".to_string()),
            ),
            CancellationReason::PlatformNotHelpful { feedback }
                if feedback.trim().chars().count() < MIN_FEEDBACK_CHARS =>
            {
                Err(FlowError::InvalidReason(format!(
                    "feedback must be at least {} characters",
                    MIN_FEEDBACK_CHARS
                )))
            }
            _ => Ok(()),
        }
    }

    /// `reason` カラムに保存する文字列
    pub fn encode(&self) -> String {
        match self {
            CancellationReason::TooExpensive { max_price } => {
                format!("too-expensive:{}", max_price.trim())
            }
            CancellationReason::PlatformNotHelpful { feedback } => {
                format!("platform-not-helpful:{}", feedback.trim())
            }
            CancellationReason::NotEnoughRelevantJobs => "not-enough-jobs".to_string(),
            CancellationReason::DecidedNotToMove => "decided-not-to-move".to_string(),
            CancellationReason::Other => "other".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    FoundJob,
    StillLooking,
    AcceptOffer,
    DeclineOffer,
    SurveySubmitted(JobSearchSurvey),
    ReasonSubmitted(CancellationReason),
    VisaAnswered(VisaSupportAnswer),
    Back,
}

impl FlowEvent {
    fn name(&self) -> &'static str {
        match self {
            FlowEvent::FoundJob => "found_job",
            FlowEvent::StillLooking => "still_looking",
            FlowEvent::AcceptOffer => "accept_offer",
            FlowEvent::DeclineOffer => "decline_offer",
            FlowEvent::SurveySubmitted(_) => "survey_submitted",
            FlowEvent::ReasonSubmitted(_) => "reason_submitted",
            FlowEvent::VisaAnswered(_) => "visa_answered",
            FlowEvent::Back => "back",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("event '{event}' is not allowed at step '{step}'")]
    InvalidTransition {
        step: CancellationStep,
        event: &'static str,
    },

    #[error("cannot go back from the first step")]
    CannotGoBack,

    #[error("cancellation flow is already completed")]
    AlreadyCompleted,

    #[error("invalid reason: {0}")]
    InvalidReason(String),

    #[error("all survey questions must be answered")]
    IncompleteSurvey,

    #[error("visa type must be at least {} characters", MIN_VISA_TYPE_CHARS)]
    InvalidVisaType,
}

/// 解約ウィザードの状態
#[derive(Debug, Clone)]
pub struct CancellationFlow {
    variant: DownsellVariant,
    step: CancellationStep,
    path: Option<FlowPath>,
    history: Vec<CancellationStep>,
    offer_declined: bool,
    survey: Option<JobSearchSurvey>,
    reason: Option<CancellationReason>,
    visa: Option<VisaSupportAnswer>,
    outcome: Option<FlowOutcome>,
}

impl CancellationFlow {
    pub fn new(variant: DownsellVariant) -> Self {
        Self {
            variant,
            step: CancellationStep::Intro,
            path: None,
            history: Vec::new(),
            offer_declined: false,
            survey: None,
            reason: None,
            visa: None,
            outcome: None,
        }
    }

    pub fn step(&self) -> CancellationStep {
        self.step
    }

    pub fn path(&self) -> Option<FlowPath> {
        self.path
    }

    pub fn outcome(&self) -> Option<FlowOutcome> {
        self.outcome
    }

    pub fn survey(&self) -> Option<&JobSearchSurvey> {
        self.survey.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.step == CancellationStep::Completion
    }

    /// イベントを適用して遷移後のステップを返す。失敗時は状態を変えない
    pub fn apply(&mut self, event: FlowEvent) -> Result<CancellationStep, FlowError> {
        use CancellationStep as S;

        if self.is_complete() {
            return Err(FlowError::AlreadyCompleted);
        }

        let event_name = event.name();
        let next = match (self.step, event) {
            (_, FlowEvent::Back) => return self.back(),

            (S::Intro, FlowEvent::FoundJob) => {
                self.path = Some(FlowPath::FoundJob);
                S::Survey
            }
            (S::Intro, FlowEvent::StillLooking) => {
                self.path = Some(FlowPath::StillLooking);
                if self.variant.offers_discount() {
                    S::Offer
                } else {
                    S::Survey
                }
            }

            (S::Offer, FlowEvent::AcceptOffer) => {
                self.outcome = Some(FlowOutcome::DownsellAccepted);
                S::Completion
            }
            (S::Offer, FlowEvent::DeclineOffer) => {
                self.offer_declined = true;
                S::Survey
            }

            (S::Survey, FlowEvent::SurveySubmitted(survey)) => {
                if !survey.is_complete() {
                    return Err(FlowError::IncompleteSurvey);
                }
                self.survey = Some(survey);
                match self.path {
                    Some(FlowPath::FoundJob) => S::VisaSupport,
                    _ => S::Reason,
                }
            }

            (S::Reason, FlowEvent::ReasonSubmitted(reason)) => {
                reason.validate()?;
                self.reason = Some(reason);
                self.outcome = Some(FlowOutcome::Cancelled);
                S::Completion
            }

            (S::VisaSupport, FlowEvent::VisaAnswered(answer)) => {
                if answer.visa_type.trim().chars().count() < MIN_VISA_TYPE_CHARS {
                    return Err(FlowError::InvalidVisaType);
                }
                self.visa = Some(answer);
                self.outcome = Some(FlowOutcome::Cancelled);
                S::Completion
            }

            (step, _) => {
                return Err(FlowError::InvalidTransition {
                    step,
                    event: event_name,
                })
            }
        };

        self.history.push(self.step);
        self.step = next;
        Ok(next)
    }

    fn back(&mut self) -> Result<CancellationStep, FlowError> {
        let previous = self.history.pop().ok_or(FlowError::CannotGoBack)?;
        if previous == CancellationStep::Intro {
            self.path = None;
            self.offer_declined = false;
        }
        if previous == CancellationStep::Offer {
            self.offer_declined = false;
        }
        self.step = previous;
        Ok(previous)
    }

    /// 現在の分岐で表示するステップ一覧（intro と completion は含まない）
    fn planned_steps(&self) -> Vec<CancellationStep> {
        match self.path {
            None => Vec::new(),
            Some(FlowPath::FoundJob) => {
                vec![CancellationStep::Survey, CancellationStep::VisaSupport]
            }
            Some(FlowPath::StillLooking) if self.variant.offers_discount() => vec![
                CancellationStep::Offer,
                CancellationStep::Survey,
                CancellationStep::Reason,
            ],
            Some(FlowPath::StillLooking) => {
                vec![CancellationStep::Survey, CancellationStep::Reason]
            }
        }
    }

    /// プログレス表示用の (現在位置, 総数)。1始まり
    pub fn step_position(&self) -> Option<(usize, usize)> {
        let planned = self.planned_steps();
        let total = planned.len();
        if self.is_complete() {
            return Some((total, total));
        }
        planned
            .iter()
            .position(|step| *step == self.step)
            .map(|index| (index + 1, total))
    }

    /// 完了したフローを `POST /cancellations` の入力に変換する
    pub fn submission(&self) -> Option<SubmitCancellationDto> {
        match self.outcome? {
            FlowOutcome::DownsellAccepted => Some(SubmitCancellationDto {
                subscription_id: None,
                reason: None,
                accepted_downsell: Some(true),
                accepted: Some(false),
            }),
            FlowOutcome::Cancelled => {
                let reason = match (&self.reason, &self.visa) {
                    (Some(reason), _) => reason.encode(),
                    (None, Some(visa)) => format!(
                        "found-job:lawyer={}:visa={}",
                        if visa.company_provides_lawyer { "yes" } else { "no" },
                        visa.visa_type.trim()
                    ),
                    (None, None) => "other".to_string(),
                };
                Some(SubmitCancellationDto {
                    subscription_id: None,
                    reason: Some(reason),
                    // オファーを見ていない分岐では保存済みの値を残す
                    accepted_downsell: self.offer_declined.then_some(false),
                    accepted: Some(true),
                })
            }
        }
    }
}
