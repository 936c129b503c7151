//! Built-in causal knowledge for the power subsystem.
//!
//! A cause either resolves directly to a remedy or branches into subcauses
//! that each carry their own remedy. The tagged [`CauseNode`] variant makes
//! seeding a single recursive match instead of shape-sniffing nested
//! literals.

/// A terminal repair action and the observable condition confirming it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remedy {
    pub repair: &'static str,
    pub validation: &'static str,
}

/// One cause's resolution: a direct remedy, or subcause refinements.
#[derive(Debug, Clone, Copy)]
pub enum CauseNode {
    Leaf(Remedy),
    Branch(&'static [(&'static str, Remedy)]),
}

/// The causal knowledge of one top-level subsystem:
/// event → cause → subcause? → repair → validation chains.
#[derive(Debug, Clone, Copy)]
pub struct SystemKnowledge {
    pub system: &'static str,
    pub events: &'static [(&'static str, &'static [(&'static str, CauseNode)])],
}

const fn remedy(repair: &'static str, validation: &'static str) -> Remedy {
    Remedy { repair, validation }
}

/// Power-subsystem knowledge base.
pub const POWER_SYSTEM: SystemKnowledge = SystemKnowledge {
    system: "电源分系统",
    events: &[
        (
            "母线电压异常",
            &[
                (
                    "母线电压调节失灵",
                    CauseNode::Branch(&[
                        (
                            "DC-DC模块漂移/失效",
                            remedy("重置并切换到冗余电源单元", "母线电压恢复并稳定在额定范围"),
                        ),
                        (
                            "参考电压源故障",
                            remedy("重启电源控制单元（软重启/硬重启）", "母线电压恢复并稳定在额定范围"),
                        ),
                    ]),
                ),
                (
                    "电压瞬变/尖峰",
                    CauseNode::Branch(&[
                        (
                            "开关切换干扰",
                            remedy("重标定电压/电流采样通道", "母线电压恢复并稳定在额定范围"),
                        ),
                        (
                            "外部放电事件（弧光/等离子）",
                            remedy("地面命令执行紧急断路/熔断保护", "母线电流恢复正常且无超限脉动"),
                        ),
                    ]),
                ),
                (
                    "母线接地/漏电",
                    CauseNode::Leaf(remedy(
                        "切换旁路/隔离故障段（断开短路段）",
                        "故障段电流降为零且负载恢复",
                    )),
                ),
            ],
        ),
        (
            "电池性能下降/容量衰减",
            &[
                (
                    "电池老化",
                    CauseNode::Branch(&[
                        (
                            "循环寿命到期",
                            remedy("执行电池均衡/重校准程序", "电池端电压/荷电状态（SoC）按预期曲线恢复"),
                        ),
                        (
                            "温度异常加速老化",
                            remedy("启动电池加热或降温模式（温控策略）", "温度回到安全区间并稳定"),
                        ),
                    ]),
                ),
                (
                    "电池单体失效",
                    CauseNode::Leaf(remedy(
                        "隔离失效单体并切换冗余单体",
                        "电池端电压/荷电状态（SoC）按预期曲线恢复",
                    )),
                ),
            ],
        ),
        (
            "太阳能阵列发电异常",
            &[
                (
                    "光电池输出下降",
                    CauseNode::Branch(&[
                        (
                            "太阳翼未展开或角度异常",
                            remedy(
                                "展开/复位太阳翼并执行展开复位程序",
                                "太阳阵输出功率恢复至预期百分比（例如 >90% 额定）",
                            ),
                        ),
                        (
                            "光电池污染或退化",
                            remedy(
                                "启动阵面抖动清理或去污程序",
                                "太阳阵输出功率恢复至预期百分比（例如 >90% 额定）",
                            ),
                        ),
                    ]),
                ),
                (
                    "阵列馈电断路",
                    CauseNode::Leaf(remedy(
                        "检查并切换阵列馈电开关/继电器到冗余回路",
                        "母线电压恢复并稳定在额定范围",
                    )),
                ),
            ],
        ),
        (
            "过流/短路",
            &[
                (
                    "瞬时大电流/继电器粘连",
                    CauseNode::Leaf(remedy(
                        "切换旁路/隔离故障段（断开短路段）",
                        "母线电流恢复正常且无超限脉动",
                    )),
                ),
                (
                    "组件内部短路",
                    CauseNode::Branch(&[
                        (
                            "电缆绝缘破损",
                            remedy("隔离故障段并回退至冗余线路", "故障段电流降为零且负载恢复"),
                        ),
                        (
                            "功率电子器件失效",
                            remedy(
                                "切换到冗余功率变换模块并回收故障器件遥测",
                                "母线电压恢复并稳定在额定范围",
                            ),
                        ),
                    ]),
                ),
            ],
        ),
        (
            "充放电控制异常",
            &[
                (
                    "充电控制失灵",
                    CauseNode::Branch(&[
                        (
                            "最大充电限幅器失效",
                            remedy(
                                "调整充电策略并重标定充电限幅器参数",
                                "电池端电压/荷电状态（SoC）按预期曲线恢复",
                            ),
                        ),
                        (
                            "均衡电路断开",
                            remedy("执行电池均衡/重校准程序", "电池端电压/荷电状态（SoC）按预期曲线恢复"),
                        ),
                    ]),
                ),
                (
                    "放电路径异常",
                    CauseNode::Leaf(remedy(
                        "手动/自动隔离异常负载并重分配负载策略",
                        "母线电流恢复正常且无超限脉动",
                    )),
                ),
            ],
        ),
        (
            "电源控制单元（PCU）异常",
            &[
                (
                    "控制器死机/重启循环",
                    CauseNode::Leaf(remedy(
                        "重启电源控制单元（软重启/硬重启）并回退到稳定固件版本",
                        "地链通信与指令回执确认恢复",
                    )),
                ),
                (
                    "单事件翻转（SEU）引起功能异常",
                    CauseNode::Leaf(remedy(
                        "启用容错校验并切换冗余控制器路径",
                        "地链通信与指令回执确认恢复",
                    )),
                ),
            ],
        ),
        (
            "遥测/测量异常（电压/电流显示不可信）",
            &[
                (
                    "传感器误差/ADC漂移",
                    CauseNode::Leaf(remedy(
                        "重标定电压/电流采样通道",
                        "遥测中相关采样通道误差下降到可接受范围（偏差 < 指定阈值）",
                    )),
                ),
                (
                    "遥测编码/解码错误",
                    CauseNode::Leaf(remedy(
                        "重发或修正地面下发控制指令并校验回传",
                        "地链通信与指令回执确认恢复",
                    )),
                ),
            ],
        ),
        (
            "热失控（电源相关）",
            &[
                (
                    "功率转换单元过热",
                    CauseNode::Leaf(remedy(
                        "启动被动/主动散热或降额工作，并切换冗余模块",
                        "温度回到安全区间并稳定",
                    )),
                ),
                (
                    "电池热失控",
                    CauseNode::Leaf(remedy(
                        "紧急隔离故障电池组并进入安全模式",
                        "温度回到安全区间并稳定且无温度上升趋势",
                    )),
                ),
            ],
        ),
    ],
};

impl SystemKnowledge {
    /// Number of complete event → … → repair chains in this knowledge base.
    pub fn chain_count(&self) -> usize {
        self.events
            .iter()
            .flat_map(|(_, causes)| causes.iter())
            .map(|(_, node)| match node {
                CauseNode::Leaf(_) => 1,
                CauseNode::Branch(subs) => subs.len(),
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_system_has_all_events() {
        assert_eq!(POWER_SYSTEM.system, "电源分系统");
        assert_eq!(POWER_SYSTEM.events.len(), 8);
        assert!(POWER_SYSTEM
            .events
            .iter()
            .any(|(event, _)| *event == "母线电压异常"));
    }

    #[test]
    fn test_every_remedy_is_complete() {
        for (event, causes) in POWER_SYSTEM.events {
            assert!(!causes.is_empty(), "event {} has no causes", event);
            for (cause, node) in *causes {
                match node {
                    CauseNode::Leaf(r) => {
                        assert!(!r.repair.is_empty(), "{}/{}", event, cause);
                        assert!(!r.validation.is_empty(), "{}/{}", event, cause);
                    }
                    CauseNode::Branch(subs) => {
                        assert!(!subs.is_empty(), "{}/{} branch empty", event, cause);
                        for (sub, r) in *subs {
                            assert!(!sub.is_empty());
                            assert!(!r.repair.is_empty(), "{}/{}/{}", event, cause, sub);
                            assert!(!r.validation.is_empty());
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_chain_count() {
        assert_eq!(POWER_SYSTEM.chain_count(), 23);
    }
}
