//! Closed-set subsystem router.
//!
//! First triage step: attribute an anomaly event to exactly one of the
//! satellite's named subsystems. Built on the validation retry loop with a
//! membership validator and default-substitution on exhaustion, so the
//! answer is always a member of the closed set no matter what the model
//! returns.

use crate::retry::{Accepted, ExhaustionPolicy, RetrySession, Transcript};
use crate::ChatBackend;
use tracing::info;
use vesta_common::VestaError;

/// The closed label set: the satellite's named subsystems.
pub const SUBSYSTEMS: [&str; 6] = ["结构", "载荷", "电源", "热控", "姿轨控制", "测控与数据处理"];

/// Fallback label substituted when the retry budget is exhausted.
pub const DEFAULT_SUBSYSTEM: &str = "电源";

const ROUTER_SYSTEM_PROMPT: &str =
    "你是一个卫星运维专家，你的任务是：对捕获的卫星异常事件（Event）进行故障排查和修复。深呼吸，一步一步来。";

const ROUTER_CORRECTION: &str = "解析失败，只输出分系统名称，不需要多余解释和格式";

/// Reference primer on the satellite's subsystem decomposition, given to the
/// model as routing context.
const KNOWLEDGE_BLOCK: &str = "\
1.卫星由多个分系统组成，包括结构、载荷、电源、热控、姿轨控制、测控与数据处理。
2.结构分系统：功能:提供卫星的物理支撑保护内部设备免受发射振动、太空环境的影响。组成:框架、外壳、支架等轻量化高强度材料(如碳纤维、铝合金)
3.载荷分系统：功能:执行卫星的核心任务如通信、遥感、导航、科学探测等)组成:相机、雷达、通信转发器、科学仪器等。
4.电源分系统：功能:为全卫星供电并管理能源。组成:太阳能电池板(主能源)、蓄电池、电源控制与分配单元。
5.热控分系统：功能:维持设备在适宜温度范围(-40°C至+50°C)防止过热或过冷失效。方式:被动:隔热层、热反射涂层、热管。主动:电加热器、散热器。
6.姿轨控制分系统：功能:控制卫星在太空中的姿态(指向方向)和稳定性。组成:传感器:陀螺仪、星敏感器、太阳敏感器。执行机构:反作用轮、磁力矩器推进器。
7.测控与数据处理分系统：功能:处理卫星内部数据、协调各分系统工作、接收地面指令、向地面发送卫星状态数据和载荷数据组成:天线、收发机、数据存储设备中央计算、总线、接口模块";

/// True if `label` is a member of the closed subsystem set.
pub fn is_known_subsystem(label: &str) -> bool {
    SUBSYSTEMS.contains(&label)
}

fn task_prompt(event: &str) -> String {
    format!(
        "Event:{event}\n\
参考资料:{KNOWLEDGE_BLOCK}\n\
当前环节:基于参考资料将该异常初步归因到以下分系统中的一个：\n\
结构, 载荷, 电源, 热控, 姿轨控制, 测控与数据处理\n\
只输出分系统名称，不需要多余解释和格式"
    )
}

/// Single-label classifier over the closed subsystem set.
pub struct SubsystemRouter<'a> {
    backend: &'a dyn ChatBackend,
    model: String,
    max_retries: usize,
}

impl<'a> SubsystemRouter<'a> {
    pub fn new(backend: &'a dyn ChatBackend, model: impl Into<String>, max_retries: usize) -> Self {
        Self {
            backend,
            model: model.into(),
            max_retries,
        }
    }

    /// Classify one event. Always resolves to a label from [`SUBSYSTEMS`];
    /// the returned [`Accepted`] keeps the session transcript for follow-up
    /// turns and records whether the fallback fired.
    pub async fn route(&self, event: &str) -> Result<Accepted, VestaError> {
        let session = RetrySession::new(
            self.backend,
            self.model.clone(),
            0.0,
            false,
            self.max_retries,
            ROUTER_CORRECTION,
            ExhaustionPolicy::Fallback(DEFAULT_SUBSYSTEM.to_string()),
        );
        let transcript = Transcript::seeded(ROUTER_SYSTEM_PROMPT, &task_prompt(event));
        let accepted = session.run(transcript, is_known_subsystem).await?;
        info!(
            "Routed event '{}' to subsystem '{}'{}",
            event,
            accepted.response,
            if accepted.substituted { " (fallback)" } else { "" }
        );
        Ok(accepted)
    }
}
